//! Browser configuration for rendered fetching.
//!
//! Always compiled, with or without the `browser` feature.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Browser settings for the rendered-page fetcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrowserConfig {
    /// Try the rendered fetcher before plain HTTP.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Run in headless mode (default: true).
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    #[serde(default)]
    pub proxy: Option<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to existing browser instead of launching one.
    /// Can also be set via BROWSER_URL environment variable.
    #[serde(default)]
    pub remote_url: Option<String>,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Hard page load timeout in seconds.
    #[serde(default = "default_page_load_timeout")]
    pub page_load_timeout: u64,

    /// Upper bound on the tag stabilization loop, in milliseconds.
    #[serde(default = "default_settle_timeout_ms")]
    pub settle_timeout_ms: u64,

    /// Delay between tag count polls, in milliseconds.
    #[serde(default = "default_settle_poll_ms")]
    pub settle_poll_ms: u64,

    /// How long the tag count must hold steady, in milliseconds.
    #[serde(default = "default_settle_window_ms")]
    pub settle_window_ms: u64,

    /// Pause after each recovery action, in milliseconds.
    #[serde(default = "default_recovery_pause_ms")]
    pub recovery_pause_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            headless: default_headless(),
            proxy: None,
            remote_url: None,
            chrome_args: Vec::new(),
            page_load_timeout: default_page_load_timeout(),
            settle_timeout_ms: default_settle_timeout_ms(),
            settle_poll_ms: default_settle_poll_ms(),
            settle_window_ms: default_settle_window_ms(),
            recovery_pause_ms: default_recovery_pause_ms(),
        }
    }
}

impl BrowserConfig {
    /// Apply environment variable overrides.
    ///
    /// - `BROWSER_URL` - Remote Chrome DevTools URL
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("BROWSER_URL") {
            if !val.trim().is_empty() {
                self.remote_url = Some(val.trim().to_string());
            }
        }
        self
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout)
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }

    pub fn settle_poll_interval(&self) -> Duration {
        Duration::from_millis(self.settle_poll_ms)
    }

    pub fn settle_window(&self) -> Duration {
        Duration::from_millis(self.settle_window_ms)
    }

    pub fn recovery_pause(&self) -> Duration {
        Duration::from_millis(self.recovery_pause_ms)
    }
}

fn default_enabled() -> bool {
    true
}

fn default_headless() -> bool {
    true
}

fn default_page_load_timeout() -> u64 {
    15
}

fn default_settle_timeout_ms() -> u64 {
    5_000
}

fn default_settle_poll_ms() -> u64 {
    100
}

fn default_settle_window_ms() -> u64 {
    1_000
}

fn default_recovery_pause_ms() -> u64 {
    1_000
}
