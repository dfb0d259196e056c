use std::time::Duration;

use super::Driver;
use crate::error::{HarnessError, Result};

impl Driver {
    /// Open `url`, then maximize the window unless the capability is mobile.
    pub async fn navigate(&self, url: &str) -> Result<()> {
        self.session.navigate(url).await?;
        if self.capability.is_mobile() {
            tracing::debug!("Skipping maximize on {}", self.capability.name());
        } else {
            self.session.maximize().await?;
        }
        Ok(())
    }

    pub async fn reload(&self) -> Result<()> {
        self.session.reload().await?;
        Ok(())
    }

    /// Switch to the tab at `index` (0 is the tab the session started with).
    ///
    /// The tab list is fetched on every call since the page may have opened
    /// new tabs since the last one.
    pub async fn switch_tab(&self, index: usize) -> Result<()> {
        let ids = self.session.tab_ids().await?;
        let id = ids.get(index).ok_or(HarnessError::TabNotFound {
            index,
            open: ids.len(),
        })?;
        self.session.switch_tab(id).await?;
        tracing::info!("Switched to tab {} of {}", index, ids.len());
        Ok(())
    }

    /// Open `url` in a new tab and continue in that tab.
    pub async fn open_tab(&self, url: &str) -> Result<()> {
        let id = self.session.open_tab(url).await?;
        tracing::info!("Continuing in new tab {}", id);
        Ok(())
    }

    /// Give the page `delay` (or the configured dialog delay) to raise its
    /// dialog, then accept it.
    pub async fn accept_alert(&self, delay: Option<Duration>) -> Result<()> {
        self.answer_dialog(true, delay).await
    }

    pub async fn dismiss_alert(&self, delay: Option<Duration>) -> Result<()> {
        self.answer_dialog(false, delay).await
    }

    async fn answer_dialog(&self, accept: bool, delay: Option<Duration>) -> Result<()> {
        self.session
            .pause(delay.unwrap_or(self.timing.dialog_delay))
            .await;
        self.session.handle_dialog(accept).await?;
        Ok(())
    }
}
