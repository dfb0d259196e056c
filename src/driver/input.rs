use super::{Driver, WaitCondition};
use crate::error::Result;
use crate::selectors::Selector;
use crate::session::SessionError;

impl Driver {
    async fn wait_editable(&self, selector: &Selector) -> Result<()> {
        let timeout = self.timing.wait_timeout;
        self.wait_for(selector, WaitCondition::Exists, timeout).await?;
        self.wait_for(selector, WaitCondition::Enabled, timeout).await
    }

    /// Replace the field's value with `text`. Nothing is appended; existing
    /// content is overwritten.
    pub async fn fill_text(&self, selector: &Selector, text: &str) -> Result<()> {
        self.wait_editable(selector).await?;
        self.session.set_value(selector, text).await?;
        tracing::debug!("Filled {} ({} chars)", selector, text.chars().count());
        Ok(())
    }

    /// Empty the field. Clearing an already empty field succeeds.
    pub async fn clear_text(&self, selector: &Selector) -> Result<()> {
        self.wait_editable(selector).await?;
        self.session.clear(selector).await?;
        Ok(())
    }

    /// Press Enter in the field, e.g. to submit its form.
    pub async fn send_enter(&self, selector: &Selector) -> Result<()> {
        self.wait_for(selector, WaitCondition::Visible, self.timing.wait_timeout)
            .await?;
        let list = selector.elements_js().map_err(SessionError::protocol)?;
        self.session
            .execute_script(&format!("(() => {{ const el = ({list})[0]; if (el) el.focus(); }})()"))
            .await?;
        self.session.send_keys("Enter").await?;
        Ok(())
    }
}
