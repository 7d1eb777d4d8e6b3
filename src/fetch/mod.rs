//! Page acquisition.
//!
//! Two strategies sit behind [`PageFetcher`]: a browser that renders the
//! page with client-side scripts, and a plain HTTP GET.

pub mod browser;
pub mod cookies;
pub mod http;

use async_trait::async_trait;

use crate::error::FetchError;

pub use browser::RenderedFetcher;
pub use cookies::{BrowserCookie, SessionCookies};
pub use http::{PlainFetcher, PlainResponse};

/// Which strategy produced a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    Rendered,
    Plain,
}

impl FetchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rendered => "rendered",
            Self::Plain => "plain",
        }
    }
}

/// Markup obtained for a URL.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub markup: String,
    pub source: FetchSource,
}

/// A way of obtaining page markup.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Fetch a page.
    ///
    /// `Ok(None)` means the page could not be loaded but the fetcher itself
    /// is healthy; callers treat it like an error and move on.
    async fn fetch(&self, url: &str) -> Result<Option<FetchedPage>, FetchError>;
}
