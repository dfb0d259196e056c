use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::driver::WaitCondition;
use crate::locators::Category;
use crate::mail::MailError;
use crate::session::SessionError;

/// Every failure a step can surface to the runner.
///
/// Nothing in the library turns one of these into a default value; absence of
/// a page, an element name or a UI element is always reported.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// No locator document exists for the page name.
    #[error("no locator document for page '{page}'")]
    NotFound { page: String },

    /// The document exists but does not define the logical element.
    #[error("page '{page}' has no {category} entry named '{name}'")]
    MissingElement {
        page: String,
        category: Category,
        name: String,
    },

    #[error("timed out after {}ms waiting for {selector} to be {condition}{}",
        .timeout.as_millis(), last_error_suffix(.last_error))]
    Timeout {
        selector: String,
        condition: WaitCondition,
        timeout: Duration,
        last_error: Option<SessionError>,
    },

    #[error("click on {selector} failed after {attempts} attempt(s): {source}")]
    ClickFailed {
        selector: String,
        attempts: u32,
        #[source]
        source: SessionError,
    },

    #[error("no page context: use a 'go to' or 'am on' step first")]
    NoPageContext,

    #[error("tab {index} does not exist ({open} open)")]
    TabNotFound { index: usize, open: usize },

    #[error("expected {subject} to contain '{expected}', found '{actual}'")]
    Assertion {
        subject: String,
        expected: String,
        actual: String,
    },

    #[error("no step definition matches: {0}")]
    UndefinedStep(String),

    #[error("invalid tag expression '{expression}': {reason}")]
    InvalidTagExpression { expression: String, reason: String },

    #[error("mail steps need a mailbox; pass --gmail-credentials")]
    MailUnavailable,

    #[error("failed to load locator document {}: {source}", .path.display())]
    LocatorLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid locator document {}: {source}", .path.display())]
    LocatorParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Mail(#[from] MailError),
}

fn last_error_suffix(last_error: &Option<SessionError>) -> String {
    last_error
        .as_ref()
        .map(|e| format!(" (last error: {e})"))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, HarnessError>;

impl HarnessError {
    pub fn assertion(
        subject: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::Assertion {
            subject: subject.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// True for failures caused by locator configuration rather than the UI.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::MissingElement { .. }
                | Self::LocatorLoad { .. }
                | Self::LocatorParse { .. }
                | Self::UndefinedStep(_)
        )
    }
}
