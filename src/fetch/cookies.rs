//! Caller-supplied session cookies.
//!
//! Cookies come from a JSON export (an array of objects with `name` or
//! `key`, `value`, `domain` and optionally `path`, `secure`, `httpOnly`).
//! Entries without a name or domain are skipped.

use std::path::Path;

use reqwest::cookie::Jar;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
#[cfg(feature = "browser")]
use tracing::warn;

use crate::error::ConfigError;

/// One cookie of the authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
}

impl BrowserCookie {
    fn from_value(cookie: &serde_json::Value) -> Option<Self> {
        let text = |key: &str| cookie.get(key).and_then(|v| v.as_str());
        let flag = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| cookie.get(*k).and_then(|v| v.as_bool()))
                .unwrap_or(false)
        };

        let name = text("name").or_else(|| text("key")).unwrap_or_default();
        let domain = text("domain").unwrap_or_default();
        if name.is_empty() || domain.is_empty() {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            value: text("value").unwrap_or_default().to_string(),
            domain: domain.to_string(),
            path: text("path")
                .filter(|p| !p.is_empty())
                .unwrap_or("/")
                .to_string(),
            secure: flag(&["secure"]),
            http_only: flag(&["httpOnly", "http_only"]),
        })
    }

    /// Domain without the leading dot of domain-wide cookies.
    pub fn host(&self) -> &str {
        self.domain.trim_start_matches('.')
    }

    /// URL a cookie jar should file this cookie under.
    fn origin(&self) -> Option<Url> {
        let scheme = if self.secure { "https" } else { "http" };
        Url::parse(&format!("{}://{}{}", scheme, self.host(), self.path)).ok()
    }

    /// `Set-Cookie` style line. A leading dot on the domain makes the cookie
    /// apply to subdomains, otherwise it is host-only.
    fn set_cookie_line(&self) -> String {
        let mut line = format!("{}={}; Path={}", self.name, self.value, self.path);
        if self.domain.starts_with('.') {
            line.push_str(&format!("; Domain={}", self.host()));
        }
        if self.secure {
            line.push_str("; Secure");
        }
        if self.http_only {
            line.push_str("; HttpOnly");
        }
        line
    }
}

/// The authenticated cookie set reused by every fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCookies {
    cookies: Vec<BrowserCookie>,
}

impl SessionCookies {
    pub fn new(cookies: Vec<BrowserCookie>) -> Self {
        Self { cookies }
    }

    /// Parse a JSON cookie export.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let raw: Vec<serde_json::Value> = serde_json::from_str(text)?;
        Ok(Self {
            cookies: raw.iter().filter_map(BrowserCookie::from_value).collect(),
        })
    }

    /// Load a JSON cookie export from disk.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading cookies from {:?}", path);

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Cookies {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BrowserCookie> {
        self.cookies.iter()
    }

    /// Cookie jar for the plain HTTP client.
    pub fn to_jar(&self) -> Jar {
        let jar = Jar::default();
        for cookie in &self.cookies {
            if let Some(origin) = cookie.origin() {
                jar.add_cookie_str(&cookie.set_cookie_line(), &origin);
            }
        }
        jar
    }

    /// Cookie parameters for a browser context.
    #[cfg(feature = "browser")]
    pub fn to_cookie_params(&self) -> Vec<CookieParam> {
        self.cookies
            .iter()
            .filter_map(|cookie| {
                let param = CookieParam::builder()
                    .name(cookie.name.as_str())
                    .value(cookie.value.as_str())
                    .domain(cookie.domain.as_str())
                    .path(cookie.path.as_str())
                    .secure(cookie.secure)
                    .http_only(cookie.http_only)
                    .build();

                match param {
                    Ok(param) => Some(param),
                    Err(e) => {
                        warn!("Failed to build cookie {}: {}", cookie.name, e);
                        None
                    }
                }
            })
            .collect()
    }
}
