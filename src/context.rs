use crate::error::{HarnessError, Result};

/// Per-scenario state threaded through every step: which page the scenario
/// is currently on. A new scenario starts with no page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioContext {
    page: Option<String>,
}

impl ScenarioContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_page(&mut self, page: impl Into<String>) {
        let page = page.into();
        tracing::debug!("Page context is now '{}'", page);
        self.page = Some(page);
    }

    pub fn page(&self) -> Result<&str> {
        self.page.as_deref().ok_or(HarnessError::NoPageContext)
    }

    pub fn reset(&mut self) {
        self.page = None;
    }
}
