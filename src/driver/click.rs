use serde::Serialize;

use super::{Driver, WaitCondition};
use crate::error::{HarnessError, Result};
use crate::selectors::Selector;
use crate::session::{ElementRef, SessionError};

/// What happened to one element during a best-effort bulk click.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "error", rename_all = "snake_case")]
pub enum ElementOutcome {
    Clicked,
    /// Not visible at the time, so not clicked.
    Hidden,
    /// The visibility check or the click failed; the sweep carried on.
    Failed(String),
}

/// Per-element outcomes of [`Driver::click_all_matching`], in match order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
    pub outcomes: Vec<ElementOutcome>,
}

impl BulkOutcome {
    pub fn matched(&self) -> usize {
        self.outcomes.len()
    }

    pub fn clicked(&self) -> usize {
        self.count(|o| matches!(o, ElementOutcome::Clicked))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ElementOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&ElementOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

impl Driver {
    /// Click the first match once it exists and is visible.
    ///
    /// The click itself is retried after [`crate::config::Timing::click_backoff`]
    /// when it fails transiently (stale node, covered by an overlay, not yet
    /// interactable), up to `click_attempts` attempts in total.
    pub async fn click(&self, selector: &Selector) -> Result<()> {
        let timeout = self.timing.wait_timeout;
        self.wait_for(selector, WaitCondition::Exists, timeout).await?;
        self.wait_for(selector, WaitCondition::Visible, timeout).await?;

        let target = ElementRef::first(selector);
        let max_attempts = self.timing.click_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.session.click(&target).await {
                Ok(()) => {
                    tracing::debug!("Clicked {} (attempt {})", selector, attempt);
                    return Ok(());
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    tracing::warn!(
                        "Click on {} failed ({}), retrying in {}ms",
                        selector,
                        e,
                        self.timing.click_backoff.as_millis()
                    );
                    self.session.pause(self.timing.click_backoff).await;
                }
                Err(source) => {
                    return Err(HarnessError::ClickFailed {
                        selector: selector.to_string(),
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }

    /// Click every currently visible match, one after another.
    ///
    /// Best effort: a match that is hidden is skipped and a match whose check
    /// or click fails is recorded and passed over, so one detached node never
    /// stops its siblings from being clicked. Only failing to enumerate the
    /// matches is an error.
    pub async fn click_all_matching(&self, selector: &Selector) -> Result<BulkOutcome> {
        let elements = self.session.find_all(selector).await?;
        let mut bulk = BulkOutcome::default();

        for element in &elements {
            let outcome = match self.click_if_visible(element).await {
                Ok(true) => ElementOutcome::Clicked,
                Ok(false) => ElementOutcome::Hidden,
                Err(e) => {
                    tracing::warn!("Ignoring failed click on {}: {}", element, e);
                    ElementOutcome::Failed(e.to_string())
                }
            };
            bulk.outcomes.push(outcome);
        }

        tracing::debug!(
            "Bulk click on {}: {} matched, {} clicked, {} failed",
            selector,
            bulk.matched(),
            bulk.clicked(),
            bulk.failed()
        );
        Ok(bulk)
    }

    async fn click_if_visible(&self, element: &ElementRef) -> std::result::Result<bool, SessionError> {
        if !self.session.element_visible(element).await? {
            return Ok(false);
        }
        self.session.click(element).await?;
        Ok(true)
    }

    /// Give an optional element a moment to show up, and click it if it did.
    pub async fn click_if_exists(&self, selector: &Selector) -> Result<bool> {
        self.session.pause(self.timing.probe_delay).await;
        if !self.element_exists(selector).await? {
            tracing::debug!("{} not present, nothing to click", selector);
            return Ok(false);
        }
        self.click(selector).await?;
        Ok(true)
    }

    /// Click every match whose text contains `text`. Returns how many were clicked.
    pub async fn click_element_with_text(&self, selector: &Selector, text: &str) -> Result<usize> {
        let mut clicked = 0;
        for element in self.session.find_all(selector).await? {
            if self.session.element_text(&element).await?.contains(text) {
                self.session.click(&element).await?;
                clicked += 1;
            }
        }
        Ok(clicked)
    }

    /// The first match that is currently visible, if any.
    pub async fn first_clickable(&self, selector: &Selector) -> Result<Option<ElementRef>> {
        for element in self.session.find_all(selector).await? {
            if matches!(self.session.element_visible(&element).await, Ok(true)) {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }

    /// Hover: move the pointer to an offset from the first match's top-left
    /// corner once it exists.
    pub async fn move_to_element(&self, selector: &Selector, x_offset: f64, y_offset: f64) -> Result<()> {
        self.should_see(selector).await?;
        self.session
            .move_to(&ElementRef::first(selector), x_offset, y_offset)
            .await?;
        Ok(())
    }

    /// Dispatch a DOM event on every match, through jQuery when the page has
    /// it so jQuery-bound handlers fire. Returns the number of matches.
    pub async fn trigger_event(&self, selector: &Selector, event: &str) -> Result<usize> {
        let timeout = self.timing.wait_timeout;
        self.wait_for(selector, WaitCondition::Visible, timeout).await?;
        self.wait_for(selector, WaitCondition::Enabled, timeout).await?;

        let list = selector.elements_js().map_err(SessionError::protocol)?;
        let script = format!(
            r#"(() => {{
                const els = {list};
                const name = {event};
                if (window.jQuery) {{
                    window.jQuery(els).trigger(name);
                }} else {{
                    els.forEach((el) => el.dispatchEvent(new Event(name, {{ bubbles: true, cancelable: true }})));
                }}
                return els.length;
            }})()"#,
            event = serde_json::to_string(event).map_err(SessionError::protocol)?
        );
        let count = self.session.execute_script(&script).await?;
        Ok(count.as_u64().unwrap_or(0) as usize)
    }
}
