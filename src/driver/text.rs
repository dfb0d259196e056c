use std::time::Duration;

use super::{poll_until, Driver, WaitCondition};
use crate::error::{HarnessError, Result};
use crate::selectors::Selector;
use crate::session::SessionError;

impl Driver {
    /// Wait until some match of `selector` shows non-empty text and return it.
    ///
    /// Every match is read on each poll and the last non-empty text wins, so
    /// with several texted matches the result is the one latest in document
    /// order. Use a selector that picks out a single element when that
    /// matters. A match that cannot be read is passed over; the returned text
    /// is trimmed.
    pub async fn get_text(&self, selector: &Selector, timeout: Duration) -> Result<String> {
        let session = &self.session;
        poll_until(selector, WaitCondition::HasText, self.poll(timeout), move || async move {
            let mut text = None;
            for element in session.find_all(selector).await? {
                let value = match session.element_text(&element).await {
                    Ok(value) => value,
                    Err(e) => {
                        tracing::debug!("Skipping {} while reading text: {}", element, e);
                        continue;
                    }
                };
                let value = value.trim();
                if !value.is_empty() {
                    text = Some(value.to_string());
                }
            }
            Ok::<_, SessionError>(text)
        })
        .await
    }

    pub async fn should_see_text(&self, selector: &Selector, expected: &str) -> Result<()> {
        let actual = self.get_text(selector, self.timing.text_timeout).await?;
        if !actual.contains(expected) {
            return Err(HarnessError::assertion(
                format!("text of {}", selector),
                expected,
                actual,
            ));
        }
        Ok(())
    }

    /// Assert on the `value` attribute of an input.
    pub async fn should_see_value(&self, selector: &Selector, expected: &str) -> Result<()> {
        self.should_see(selector).await?;
        let actual = self
            .session
            .get_attribute(selector, "value")
            .await?
            .unwrap_or_default();
        if !actual.contains(expected) {
            return Err(HarnessError::assertion(
                format!("value of {}", selector),
                expected,
                actual,
            ));
        }
        Ok(())
    }

    pub async fn title(&self) -> Result<String> {
        Ok(self.session.title().await?)
    }

    pub async fn should_have_title(&self, expected: &str) -> Result<()> {
        let actual = self.title().await?;
        if !actual.contains(expected) {
            return Err(HarnessError::assertion("page title", expected, actual));
        }
        Ok(())
    }
}
