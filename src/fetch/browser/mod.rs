//! Rendered-page fetcher driving Chrome over CDP.
//!
//! Each fetch clones the session cookies into a throwaway browser context,
//! blocks fonts, media and off-host images, loads the page, waits for the
//! client-rendered tag list to settle and returns the serialized DOM.

mod intercept;
#[cfg(feature = "browser")]
mod session;
mod settle;

pub use intercept::{FilterDecision, RequestFilter, ResourceKind};
#[cfg(feature = "browser")]
pub use session::BrowsingSession;
pub use settle::{RecoveryAction, SettleState, TagRecovery, TagSettler, RECOVERY_PLAN};

use async_trait::async_trait;
#[cfg(feature = "browser")]
use std::path::PathBuf;
#[cfg(feature = "browser")]
use std::sync::Arc;
#[cfg(feature = "browser")]
use std::time::Instant;

#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig as LaunchConfig, Page};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tokio::sync::OnceCell;
#[cfg(feature = "browser")]
use tracing::{debug, info, warn};

use super::{FetchSource, FetchedPage, PageFetcher, SessionCookies};
use crate::config::{BrowserConfig, SiteConfig};
use crate::error::FetchError;

/// Number of tag items currently in the live DOM.
#[cfg(feature = "browser")]
const TAG_COUNT_JS: &str = "document.querySelectorAll('.tagItem').length";

/// Bring the tag list into view so lazy rendering kicks in.
#[cfg(feature = "browser")]
const SCROLL_TAGS_JS: &str = "(() => { \
    const list = document.querySelector('.js-tagList'); \
    if (list) { list.scrollIntoView({ block: 'center' }); return true; } \
    return false; })()";

/// Fetches pages through a real browser.
#[cfg(feature = "browser")]
pub struct RenderedFetcher {
    config: BrowserConfig,
    min_expected_tags: usize,
    cookies: SessionCookies,
    filter: RequestFilter,
    browser: OnceCell<Arc<Browser>>,
}

#[cfg(feature = "browser")]
impl RenderedFetcher {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Common install locations
        "/opt/google/chrome/google-chrome",
    ];

    pub fn new(config: BrowserConfig, site: &SiteConfig, cookies: SessionCookies) -> Self {
        Self {
            filter: RequestFilter::new(&site.image_hosts),
            min_expected_tags: site.min_expected_tags,
            config,
            cookies,
            browser: OnceCell::new(),
        }
    }

    fn find_chrome() -> Result<PathBuf, FetchError> {
        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                info!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
        ] {
            if let Ok(path) = which::which(cmd) {
                info!("Found Chrome in PATH: {}", path.display());
                return Ok(path);
            }
        }

        Err(FetchError::Browser(
            "Chrome/Chromium not found. Install it or set BROWSER_URL to a remote DevTools endpoint"
                .to_string(),
        ))
    }

    /// Launch or connect to the shared browser on first use.
    async fn ensure_browser(&self) -> Result<Arc<Browser>, FetchError> {
        self.browser
            .get_or_try_init(|| async {
                match self.config.remote_url.as_deref() {
                    Some(url) => self.connect_remote(url).await,
                    None => self.launch().await,
                }
            })
            .await
            .cloned()
    }

    async fn launch(&self) -> Result<Arc<Browser>, FetchError> {
        info!("Launching browser (headless={})", self.config.headless);

        let mut builder = LaunchConfig::builder().chrome_executable(Self::find_chrome()?);

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = self.config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--no-sandbox")
            .arg("--disable-gpu");

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| FetchError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to launch browser: {}", e)))?;

        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(Arc::new(browser))
    }

    /// Connect to a remote Chrome instance.
    async fn connect_remote(&self, url: &str) -> Result<Arc<Browser>, FetchError> {
        info!("Connecting to remote browser at {}", url);

        let http_url = url
            .replace("ws://", "http://")
            .replace("wss://", "https://");
        let version_url = format!("{}/json/version", http_url.trim_end_matches('/'));

        let request_error = |source| FetchError::Request {
            url: version_url.clone(),
            source,
        };
        let resp: serde_json::Value = reqwest::Client::new()
            .get(&version_url)
            .send()
            .await
            .map_err(request_error)?
            .json()
            .await
            .map_err(request_error)?;

        let ws_url = resp
            .get("webSocketDebuggerUrl")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                FetchError::Browser("No webSocketDebuggerUrl in response".to_string())
            })?;

        info!("Connecting to WebSocket: {}", ws_url);

        let handler_config = chromiumoxide::handler::HandlerConfig {
            request_timeout: self.config.page_load_timeout(),
            ..Default::default()
        };

        let (browser, mut handler) = Browser::connect_with_config(ws_url, handler_config)
            .await
            .map_err(|e| FetchError::Browser(format!("Failed to connect to browser: {}", e)))?;

        tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok(Arc::new(browser))
    }

    /// Load `url` in a fresh context and return the rendered markup.
    ///
    /// `Ok(None)` when the page failed to load within the timeout.
    pub async fn fetch_rendered(&self, url: &str) -> Result<Option<String>, FetchError> {
        let browser = self.ensure_browser().await?;
        let mut session = BrowsingSession::open(browser).await?;

        let result = self.render(&mut session, url).await;
        session.close().await;
        result
    }

    async fn render(
        &self,
        session: &mut BrowsingSession,
        url: &str,
    ) -> Result<Option<String>, FetchError> {
        if !self.cookies.is_empty() {
            if let Err(e) = session
                .page()
                .set_cookies(self.cookies.to_cookie_params())
                .await
            {
                warn!("Failed to set session cookies: {}", e);
            }
        }

        session.intercept(self.filter.clone()).await?;

        let page = session.page();
        match tokio::time::timeout(self.config.page_load_timeout(), page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                warn!("Navigation to {} failed: {}", url, e);
                return Ok(None);
            }
            Err(_) => {
                warn!(
                    "Page load for {} timed out after {:?}",
                    url,
                    self.config.page_load_timeout()
                );
                return Ok(None);
            }
        }

        let settled = self.settle_tags(page).await;
        let count = self.recover_tags(page, settled).await;
        info!("Rendered {} with {} tag items", url, count);

        page.content()
            .await
            .map(Some)
            .map_err(|e| FetchError::Browser(format!("Failed to read page content: {}", e)))
    }

    async fn count_tags(page: &Page) -> usize {
        match page.evaluate(TAG_COUNT_JS).await {
            Ok(result) => result.into_value::<usize>().unwrap_or(0),
            Err(e) => {
                debug!("Tag count failed: {}", e);
                0
            }
        }
    }

    /// Poll the tag count until it holds steady or the limit passes.
    async fn settle_tags(&self, page: &Page) -> usize {
        let mut settler = TagSettler::new(self.config.settle_window(), self.config.settle_timeout());
        let started = Instant::now();

        loop {
            let count = Self::count_tags(page).await;
            match settler.observe(started.elapsed(), count) {
                SettleState::Pending => {
                    tokio::time::sleep(self.config.settle_poll_interval()).await
                }
                state => {
                    debug!("Tag count {:?} after {:?}", state, started.elapsed());
                    return count;
                }
            }
        }
    }

    /// Run the recovery plan while the tag list looks short.
    async fn recover_tags(&self, page: &Page, mut count: usize) -> usize {
        let mut recovery = TagRecovery::new(self.min_expected_tags);
        while let Some(action) = recovery.next_action(count) {
            debug!(
                "Only {} of {} expected tags, trying {:?}",
                count, self.min_expected_tags, action
            );

            if action == RecoveryAction::ScrollIntoView {
                if let Err(e) = page.evaluate(SCROLL_TAGS_JS).await {
                    debug!("Scroll failed: {}", e);
                }
            }
            tokio::time::sleep(self.config.recovery_pause()).await;
            count = Self::count_tags(page).await;
        }
        count
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl PageFetcher for RenderedFetcher {
    fn name(&self) -> &'static str {
        "rendered"
    }

    async fn fetch(&self, url: &str) -> Result<Option<FetchedPage>, FetchError> {
        info!("Fetching {} with browser", url);
        Ok(self.fetch_rendered(url).await?.map(|markup| FetchedPage {
            url: url.to_string(),
            markup,
            source: FetchSource::Rendered,
        }))
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
pub struct RenderedFetcher;

#[cfg(not(feature = "browser"))]
impl RenderedFetcher {
    pub fn new(_config: BrowserConfig, _site: &SiteConfig, _cookies: SessionCookies) -> Self {
        Self
    }

    pub async fn fetch_rendered(&self, _url: &str) -> Result<Option<String>, FetchError> {
        Err(FetchError::Browser(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
                .to_string(),
        ))
    }
}

#[cfg(not(feature = "browser"))]
#[async_trait]
impl PageFetcher for RenderedFetcher {
    fn name(&self) -> &'static str {
        "rendered"
    }

    async fn fetch(&self, url: &str) -> Result<Option<FetchedPage>, FetchError> {
        Ok(self.fetch_rendered(url).await?.map(|markup| FetchedPage {
            url: url.to_string(),
            markup,
            source: FetchSource::Rendered,
        }))
    }
}
