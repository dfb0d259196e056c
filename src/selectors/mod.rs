pub mod css;
pub mod text;
pub mod xpath;

use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// How a selector expression is resolved against the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorType {
    #[default]
    Css,
    Text,
    Xpath,
    AccessibilityId,
}

/// A parsed locator entry. May match any number of elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selector {
    pub kind: SelectorType,
    pub expr: String,
}

impl Selector {
    pub fn new(kind: SelectorType, expr: impl Into<String>) -> Self {
        Self {
            kind,
            expr: expr.into(),
        }
    }

    pub fn css(expr: impl Into<String>) -> Self {
        Self::new(SelectorType::Css, expr)
    }

    /// Parse a locator string as written in a locator document.
    ///
    /// `//a` and `(//a)[1]` are XPath, `text=Sign in` matches text content,
    /// `~Menu` is an accessibility id, and anything else is CSS (with
    /// Playwright-style `:has-text("...")` turned into a text selector).
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("//") || trimmed.starts_with("(/") {
            return Self::new(SelectorType::Xpath, trimmed);
        }
        if let Some(text) = trimmed.strip_prefix("text=") {
            return Self::new(SelectorType::Text, text);
        }
        if let Some(id) = trimmed.strip_prefix('~') {
            return Self::new(SelectorType::AccessibilityId, id);
        }
        let (expr, kind) = normalize_selector_type(trimmed, SelectorType::Css);
        Self::new(kind, expr)
    }

    /// JS expression evaluating to an array of the matching elements.
    pub fn elements_js(&self) -> Result<String> {
        match self.kind {
            SelectorType::Css => css::collect_js(&self.expr),
            SelectorType::Text => text::collect_js(&self.expr),
            SelectorType::Xpath => xpath::collect_js(&self.expr),
            SelectorType::AccessibilityId => css::accessibility_js(&self.expr),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SelectorType::Css | SelectorType::Xpath => f.write_str(&self.expr),
            SelectorType::Text => write!(f, "text={}", self.expr),
            SelectorType::AccessibilityId => write!(f, "~{}", self.expr),
        }
    }
}

impl From<&str> for Selector {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

/// Detect Playwright-style :has-text("...") and convert to text selector.
pub fn normalize_selector_type(selector: &str, selector_type: SelectorType) -> (String, SelectorType) {
    if matches!(selector_type, SelectorType::Css) {
        if let Some(start) = selector.find(":has-text(") {
            let after = &selector[start + ":has-text(".len()..];
            let (quote, rest) = if let Some(stripped) = after.strip_prefix('"') {
                ('"', stripped)
            } else if let Some(stripped) = after.strip_prefix('\'') {
                ('\'', stripped)
            } else {
                return (selector.to_string(), selector_type);
            };
            if let Some(end) = rest.find(quote) {
                let text = &rest[..end];
                return (text.to_string(), SelectorType::Text);
            }
        }
    }
    (selector.to_string(), selector_type)
}
