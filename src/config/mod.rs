//! Settings loading for threadscrape.
//!
//! Settings come from a TOML file (explicit path, `threadscrape.toml` in the
//! working directory, or `<config dir>/threadscrape/config.toml`), fall back
//! to defaults, and are finally patched by environment variables.

pub mod browser;
pub mod site;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use browser::BrowserConfig;
pub use site::{SiteConfig, DEFAULT_MIN_EXPECTED_TAGS};

use crate::error::ConfigError;

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "threadscrape.toml";

/// Plain HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpConfig {
    /// User agent override; a desktop Chrome string is used when unset.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub timeout: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout: default_http_timeout(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

fn default_http_timeout() -> u64 {
    30
}

/// Top-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub http: HttpConfig,

    /// JSON cookie export holding the authenticated session.
    #[serde(default)]
    pub cookies_file: Option<PathBuf>,
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: origin.display().to_string(),
            source,
        })
    }

    /// Read settings from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Apply environment variable overrides.
    ///
    /// - `THREADSCRAPE_COOKIES` - Cookie export file
    /// - `BROWSER_URL` - Remote Chrome DevTools URL
    /// - `THREADSCRAPE_BASE_URL` - Site origin
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("THREADSCRAPE_COOKIES") {
            if !val.trim().is_empty() {
                self.cookies_file = Some(PathBuf::from(val.trim()));
            }
        }
        self.browser = self.browser.with_env_overrides();
        self.site = self.site.with_env_overrides();
        self
    }
}

/// Find the settings file to use, if any.
pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("threadscrape").join("config.toml"))
        .filter(|path| path.exists())
}

/// Load settings, falling back to defaults when no file is found.
///
/// An explicitly given path that cannot be read is an error.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
    let settings = match find_config_file(explicit) {
        Some(path) => {
            debug!("Loading settings from {}", path.display());
            Settings::from_file(&path)?
        }
        None => {
            debug!("No settings file found, using defaults");
            Settings::default()
        }
    };

    Ok(settings.with_env_overrides())
}
