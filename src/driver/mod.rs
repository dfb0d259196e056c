//! The interaction driver: waits, retries and bulk actions on top of a
//! [`RemoteSession`].
//!
//! Every operation re-resolves its selector against the live session. Waits
//! poll at [`Timing::poll_interval`] until their condition holds or their
//! budget runs out, and report expiry as
//! [`HarnessError::Timeout`](crate::error::HarnessError::Timeout).

pub mod click;
pub mod input;
pub mod navigation;
pub mod text;
pub mod wait;

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Capability, Timing};
use crate::error::Result;
use crate::selectors::Selector;
use crate::session::{RemoteSession, SessionError};

pub use click::{BulkOutcome, ElementOutcome};
pub use wait::{poll_until, Poll, WaitCondition};

pub struct Driver {
    session: Arc<dyn RemoteSession>,
    capability: Capability,
    timing: Timing,
}

impl Driver {
    pub fn new(session: Arc<dyn RemoteSession>, capability: Capability, timing: Timing) -> Self {
        Self {
            session,
            capability,
            timing,
        }
    }

    pub fn session(&self) -> &Arc<dyn RemoteSession> {
        &self.session
    }

    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    fn poll(&self, timeout: Duration) -> Poll {
        Poll::new(self.timing.poll_interval, timeout)
    }

    /// Wait until `condition` holds for `selector`.
    pub async fn wait_for(
        &self,
        selector: &Selector,
        condition: WaitCondition,
        timeout: Duration,
    ) -> Result<()> {
        let session = &self.session;
        poll_until(selector, condition, self.poll(timeout), move || async move {
            let holds = match condition {
                WaitCondition::Exists => session.exists(selector).await?,
                WaitCondition::Visible => session.is_visible(selector).await?,
                WaitCondition::Enabled => session.is_enabled(selector).await?,
                WaitCondition::Gone => !session.exists(selector).await?,
                WaitCondition::HasText => !session.get_text(selector).await?.is_empty(),
            };
            Ok::<_, SessionError>(holds.then_some(()))
        })
        .await
    }

    pub async fn wait_until_visible(&self, selector: &Selector, timeout: Duration) -> Result<()> {
        self.wait_for(selector, WaitCondition::Visible, timeout).await
    }

    /// Wait for an element that is (or is about to be) on the page to go away.
    ///
    /// The element must exist first: the call waits for it to appear within
    /// the normal budget, then for it to disappear within
    /// [`Timing::gone_timeout`].
    pub async fn wait_until_gone(&self, selector: &Selector) -> Result<()> {
        self.wait_for(selector, WaitCondition::Exists, self.timing.wait_timeout)
            .await?;
        self.wait_for(selector, WaitCondition::Gone, self.timing.gone_timeout)
            .await
    }

    /// One existence check, no waiting.
    pub async fn element_exists(&self, selector: &Selector) -> Result<bool> {
        Ok(self.session.exists(selector).await?)
    }

    /// Wait for `selector` to exist within the normal budget.
    pub async fn should_see(&self, selector: &Selector) -> Result<()> {
        self.wait_for(selector, WaitCondition::Exists, self.timing.wait_timeout)
            .await
    }

    /// Unconditional pause to let client-side rendering finish.
    pub async fn settle(&self) {
        self.session.pause(self.timing.settle).await;
    }

    pub async fn wait_seconds(&self, seconds: u64) {
        self.session.pause(Duration::from_secs(seconds)).await;
    }
}
