use anyhow::Result;

/// JS expression yielding every element node an XPath expression selects.
pub fn collect_js(xpath: &str) -> Result<String> {
    Ok(format!(
        r#"(() => {{
            const results = [];
            const snapshot = document.evaluate(
                {xpath},
                document,
                null,
                XPathResult.ORDERED_NODE_SNAPSHOT_TYPE,
                null
            );
            for (let i = 0; i < snapshot.snapshotLength; i++) {{
                const el = snapshot.snapshotItem(i);
                if (el.nodeType === Node.ELEMENT_NODE) {{
                    results.push(el);
                }}
            }}
            return results;
        }})()"#,
        xpath = serde_json::to_string(xpath)?
    ))
}
