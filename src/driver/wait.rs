use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{HarnessError, Result};
use crate::selectors::Selector;
use crate::session::SessionResult;

/// What a wait is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitCondition {
    Exists,
    Visible,
    Enabled,
    Gone,
    HasText,
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Exists => "present",
            Self::Visible => "visible",
            Self::Enabled => "enabled",
            Self::Gone => "gone",
            Self::HasText => "showing text",
        })
    }
}

/// Interval and budget of one poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poll {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Poll {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            timeout,
        }
    }
}

/// Evaluate `probe` immediately and then once per interval until it yields a
/// value or the budget is spent.
///
/// A probe that errors counts as "not yet": pages re-render between polls and
/// a query can hit a node mid-replacement. The most recent error is attached
/// to the timeout. The final probe runs at the deadline itself, so the call
/// never returns later than `timeout` plus one probe.
pub async fn poll_until<T, F, Fut>(
    selector: &Selector,
    condition: WaitCondition,
    poll: Poll,
    mut probe: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SessionResult<Option<T>>>,
{
    let start = Instant::now();
    let deadline = start + poll.timeout;
    let mut last_error = None;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match probe().await {
            Ok(Some(value)) => {
                tracing::debug!(
                    "{} is {} after {}ms ({} polls)",
                    selector,
                    condition,
                    start.elapsed().as_millis(),
                    attempts
                );
                return Ok(value);
            }
            Ok(None) => last_error = None,
            Err(e) => {
                tracing::debug!("Poll {} for {} failed: {}", attempts, selector, e);
                last_error = Some(e);
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(HarnessError::Timeout {
                selector: selector.to_string(),
                condition,
                timeout: poll.timeout,
                last_error,
            });
        }
        tokio::time::sleep(poll.interval.min(deadline - now)).await;
    }
}
