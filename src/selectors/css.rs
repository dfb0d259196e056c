use anyhow::Result;

/// JS expression yielding every element matching a CSS selector, in document order.
pub fn collect_js(selector: &str) -> Result<String> {
    Ok(format!(
        "Array.from(document.querySelectorAll({sel}))",
        sel = serde_json::to_string(selector)?
    ))
}

/// JS expression yielding every element whose `aria-label` equals `id`.
pub fn accessibility_js(id: &str) -> Result<String> {
    let attr = format!("[aria-label={}]", serde_json::to_string(id)?);
    collect_js(&attr)
}
