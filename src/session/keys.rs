use anyhow::Result;

/// JS dispatching keydown/keypress/keyup for `key` on the focused element.
/// Enter inside a form also submits it, which synthetic key events alone do not.
pub fn key_press_js(key: &str) -> Result<String> {
    let (name, code, key_code) = key_to_code(key);
    Ok(format!(
        r#"(() => {{
            const el = document.activeElement || document.body;
            const opts = {{
                key: {name},
                code: {code},
                keyCode: {key_code},
                which: {key_code},
                bubbles: true,
                cancelable: true
            }};
            const proceed = el.dispatchEvent(new KeyboardEvent('keydown', opts));
            el.dispatchEvent(new KeyboardEvent('keypress', opts));
            el.dispatchEvent(new KeyboardEvent('keyup', opts));
            if (proceed && {name} === 'Enter' && el.form) {{
                if (el.form.requestSubmit) {{
                    el.form.requestSubmit();
                }} else {{
                    el.form.submit();
                }}
            }}
            return true;
        }})()"#,
        name = serde_json::to_string(&name)?,
        code = serde_json::to_string(&code)?,
        key_code = key_code,
    ))
}

/// Map a key name (or a WebDriver key codepoint such as `\u{E007}`) to its
/// DOM `key`, `code` and legacy `keyCode`.
fn key_to_code(key: &str) -> (String, String, u32) {
    let named = |name: &str, code: u32| (name.to_string(), name.to_string(), code);
    match key {
        "Enter" | "Return" | "\u{E007}" | "\u{E006}" => named("Enter", 13),
        "Tab" | "\u{E004}" => named("Tab", 9),
        "Escape" | "\u{E00C}" => named("Escape", 27),
        "Backspace" | "\u{E003}" => named("Backspace", 8),
        "Delete" | "\u{E017}" => named("Delete", 46),
        "ArrowUp" => named("ArrowUp", 38),
        "ArrowDown" => named("ArrowDown", 40),
        "ArrowLeft" => named("ArrowLeft", 37),
        "ArrowRight" => named("ArrowRight", 39),
        "Home" => named("Home", 36),
        "End" => named("End", 35),
        "PageUp" => named("PageUp", 33),
        "PageDown" => named("PageDown", 34),
        "Space" | " " => (" ".into(), "Space".into(), 32),
        _ => (
            key.to_string(),
            format!("Key{}", key.to_uppercase()),
            key.chars()
                .next()
                .map(|c| c.to_ascii_uppercase() as u32)
                .unwrap_or(0),
        ),
    }
}
