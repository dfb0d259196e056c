//! The remote browser session boundary.
//!
//! The driver only ever talks to a [`RemoteSession`]; [`CdpSession`] is the
//! Chrome DevTools implementation. Element handles are never retained: an
//! [`ElementRef`] is a selector plus a position and is re-resolved against the
//! live page on every call.

pub mod cdp;
pub mod keys;
pub mod launcher;
pub mod pool;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::selectors::Selector;

pub use cdp::CdpSession;

/// Failures reported by the remote session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no element matches {0}")]
    NoSuchElement(String),

    #[error("element {0} is no longer attached to the page")]
    Stale(String),

    #[error("click on {0} was intercepted by another element")]
    Intercepted(String),

    #[error("element {0} is not interactable")]
    NotInteractable(String),

    #[error("no tab with id {0}")]
    NoSuchTab(String),

    #[error("remote session error: {0}")]
    Protocol(String),
}

impl SessionError {
    pub fn protocol(err: impl std::fmt::Display) -> Self {
        Self::Protocol(err.to_string())
    }

    /// Failures that are expected to clear up if the action is repeated.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Stale(_) | Self::Intercepted(_) | Self::NotInteractable(_)
        )
    }
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// One element among the matches of a selector, by document-order position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef {
    pub selector: Selector,
    pub index: usize,
}

impl ElementRef {
    pub fn new(selector: Selector, index: usize) -> Self {
        Self { selector, index }
    }

    /// The element a plain selector-level action targets.
    pub fn first(selector: &Selector) -> Self {
        Self::new(selector.clone(), 0)
    }
}

impl std::fmt::Display for ElementRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.selector, self.index)
    }
}

/// Operations the harness needs from a live browser or device session.
///
/// Selector-level queries look at the first match; `exists` is true when
/// there is at least one. Implementations must serialize their own commands:
/// callers never issue two operations concurrently.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    async fn navigate(&self, url: &str) -> SessionResult<()>;

    async fn reload(&self) -> SessionResult<()>;

    /// Maximize the browser window. Not supported on mobile sessions.
    async fn maximize(&self) -> SessionResult<()>;

    async fn title(&self) -> SessionResult<String>;

    async fn find_all(&self, selector: &Selector) -> SessionResult<Vec<ElementRef>>;

    async fn exists(&self, selector: &Selector) -> SessionResult<bool>;

    async fn is_visible(&self, selector: &Selector) -> SessionResult<bool>;

    async fn is_enabled(&self, selector: &Selector) -> SessionResult<bool>;

    async fn element_visible(&self, element: &ElementRef) -> SessionResult<bool>;

    async fn element_text(&self, element: &ElementRef) -> SessionResult<String>;

    async fn click(&self, element: &ElementRef) -> SessionResult<()>;

    /// Replace the value of an input with `text`.
    async fn set_value(&self, selector: &Selector, text: &str) -> SessionResult<()>;

    async fn clear(&self, selector: &Selector) -> SessionResult<()>;

    async fn get_text(&self, selector: &Selector) -> SessionResult<String>;

    async fn get_attribute(&self, selector: &Selector, name: &str)
        -> SessionResult<Option<String>>;

    /// Send a named key (`Enter`, `Tab`, ...) to the focused element.
    async fn send_keys(&self, key: &str) -> SessionResult<()>;

    async fn tab_ids(&self) -> SessionResult<Vec<String>>;

    async fn switch_tab(&self, id: &str) -> SessionResult<()>;

    async fn execute_script(&self, script: &str) -> SessionResult<serde_json::Value>;

    /// Accept or dismiss the JavaScript dialog the page is showing.
    async fn handle_dialog(&self, accept: bool) -> SessionResult<()>;

    /// Open `url` in a new tab, make it the active tab and return its id.
    async fn open_tab(&self, url: &str) -> SessionResult<String>;

    /// Move the pointer to an offset from the top-left corner of `element`.
    async fn move_to(&self, element: &ElementRef, x_offset: f64, y_offset: f64) -> SessionResult<()>;

    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
