//! Resolved run configuration.
//!
//! Values arrive already resolved from the command line / environment in
//! `main.rs`; nothing in the library reads the process environment.

use std::path::PathBuf;
use std::time::Duration;

/// The browser/device capability a run targets, e.g. `chrome` or `android_chrome`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    name: String,
}

impl Capability {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mobile capabilities cannot resize their window.
    pub fn is_mobile(&self) -> bool {
        self.name.contains("android") || self.name.contains("iphone") || self.name.contains("Mobile")
    }

    pub fn is_android(&self) -> bool {
        self.name.contains("android")
    }
}

impl Default for Capability {
    fn default() -> Self {
        Self::new("chrome")
    }
}

/// Every interval and budget the driver and runner use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Delay between two evaluations of a wait condition.
    pub poll_interval: Duration,
    /// Budget for exists/visible/enabled waits.
    pub wait_timeout: Duration,
    /// Budget for an element to disappear.
    pub gone_timeout: Duration,
    /// Budget for text to show up in text assertions.
    pub text_timeout: Duration,
    /// Total click attempts when the click itself fails transiently.
    pub click_attempts: u32,
    pub click_backoff: Duration,
    /// Pause after clicking a button so client-side rendering can catch up.
    pub settle: Duration,
    /// Pause before checking for an optional element.
    pub probe_delay: Duration,
    /// Pause before reloading the session between scenarios.
    pub scenario_reset_pause: Duration,
    /// Pause before answering a JavaScript dialog.
    pub dialog_delay: Duration,
    pub mail_poll_interval: Duration,
    pub mail_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            wait_timeout: Duration::from_secs(60),
            gone_timeout: Duration::from_secs(120),
            text_timeout: Duration::from_secs(50),
            click_attempts: 3,
            click_backoff: Duration::from_secs(2),
            settle: Duration::from_millis(1500),
            probe_delay: Duration::from_secs(3),
            scenario_reset_pause: Duration::from_secs(2),
            dialog_delay: Duration::from_secs(3),
            mail_poll_interval: Duration::from_secs(1),
            mail_timeout: Duration::from_secs(60),
        }
    }
}

impl Timing {
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

pub const DEFAULT_BASE_URL: &str = "http://news.ycombinator.com";

/// Where locator documents live and which site the pages belong to.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub base_url: String,
    pub locator_root: PathBuf,
    /// Optional product sub-directory of `locator_root`.
    pub product: Option<String>,
    pub capability: Capability,
    pub timing: Timing,
}

impl HarnessConfig {
    pub fn new(locator_root: impl Into<PathBuf>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            locator_root: locator_root.into(),
            product: None,
            capability: Capability::default(),
            timing: Timing::default(),
        }
    }

    /// Directory holding one `<page>.json` per page.
    pub fn locator_dir(&self) -> PathBuf {
        match self.product.as_deref().filter(|p| !p.is_empty()) {
            Some(product) => self.locator_root.join(product),
            None => self.locator_root.clone(),
        }
    }

    /// Absolute URL for a page path from a locator document.
    pub fn page_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}{}", self.base_url.trim_end_matches('/'), ensure_leading_slash(path))
    }
}

fn ensure_leading_slash(path: &str) -> String {
    if path.is_empty() || path.starts_with('/') || path.starts_with('?') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
