use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

/// How a local Chrome is started for a run.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    /// Explicit browser binary; searched for when absent.
    pub chrome_path: Option<PathBuf>,
    pub window_size: (u32, u32),
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            window_size: (1280, 720),
        }
    }
}

/// Resolve the browser binary: the explicit path if it exists, otherwise the
/// platform install locations, otherwise `PATH`.
pub fn find_chrome_binary(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        bail!("Chrome binary not found at {}", path.display());
    }

    let candidates = chrome_candidates();
    if let Some(path) = candidates.iter().find(|p| p.exists()) {
        tracing::info!("Found Chrome at: {}", path.display());
        return Ok(path.clone());
    }

    if let Some(path) = PATH_NAMES.iter().find_map(|name| which::which(name).ok()) {
        tracing::info!("Found Chrome in PATH: {}", path.display());
        return Ok(path);
    }

    let searched: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
    bail!(
        "Could not find Chrome or Chromium (searched {} and PATH for {}); pass --chrome-path",
        searched.join(", "),
        PATH_NAMES.join(", ")
    )
}

const PATH_NAMES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium-browser",
    "chromium",
];

#[cfg(target_os = "macos")]
fn chrome_candidates() -> Vec<PathBuf> {
    [
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

#[cfg(target_os = "windows")]
fn chrome_candidates() -> Vec<PathBuf> {
    ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"]
        .iter()
        .filter_map(|var| std::env::var_os(var))
        .map(|dir| PathBuf::from(dir).join(r"Google\Chrome\Application\chrome.exe"))
        .collect()
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn chrome_candidates() -> Vec<PathBuf> {
    PATH_NAMES
        .iter()
        .map(|name| Path::new("/usr/bin").join(name))
        .chain([PathBuf::from("/snap/bin/chromium")])
        .collect()
}

/// Extra command-line switches for a scenario browser. Window size and the
/// user data directory are set through the browser config itself.
pub fn chrome_args(options: &LaunchOptions) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--no-first-run".into(),
        "--no-default-browser-check".into(),
        "--disable-background-networking".into(),
        "--disable-client-side-phishing-detection".into(),
        "--disable-default-apps".into(),
        "--disable-extensions".into(),
        "--disable-hang-monitor".into(),
        "--disable-popup-blocking".into(),
        "--disable-prompt-on-repost".into(),
        "--disable-sync".into(),
        "--disable-translate".into(),
        "--metrics-recording-only".into(),
        "--safebrowsing-disable-auto-update".into(),
    ];

    if options.headless {
        args.push("--headless=new".into());
    }

    args
}
