use anyhow::Result;

/// JS expression yielding the parent element of every text node containing
/// `text` (case-insensitive), each element at most once.
pub fn collect_js(text: &str) -> Result<String> {
    Ok(format!(
        r#"(() => {{
            const target = {text}.toLowerCase();
            const results = [];
            const seen = new Set();
            const walker = document.createTreeWalker(
                document.body,
                NodeFilter.SHOW_TEXT,
                null
            );
            while (walker.nextNode()) {{
                const node = walker.currentNode;
                if (node.textContent.trim().toLowerCase().includes(target)) {{
                    const el = node.parentElement;
                    if (el && !seen.has(el)) {{
                        seen.add(el);
                        results.push(el);
                    }}
                }}
            }}
            return results;
        }})()"#,
        text = serde_json::to_string(text)?
    ))
}
