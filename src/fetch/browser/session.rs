//! Disposable browser context holding one page.

use std::sync::Arc;

use chromiumoxide::cdp::browser_protocol::browser::BrowserContextId;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams, RequestPattern,
    RequestStage,
};
use chromiumoxide::cdp::browser_protocol::network::ErrorReason;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::intercept::{FilterDecision, RequestFilter, ResourceKind};
use crate::error::FetchError;

fn browser_error(what: &str, e: impl std::fmt::Display) -> FetchError {
    FetchError::Browser(format!("{}: {}", what, e))
}

/// An isolated browser context with a single page.
///
/// Cookies set here never reach the browser's default context. Cleanup
/// stops request interception, closes the page and disposes the context.
/// Call [`BrowsingSession::close`]; if the session is dropped instead (an
/// error or a cancelled future), cleanup is spawned on the runtime.
pub struct BrowsingSession {
    browser: Arc<Browser>,
    context_id: BrowserContextId,
    page: Page,
    interceptor: Option<JoinHandle<()>>,
    closed: bool,
    runtime: tokio::runtime::Handle,
}

impl BrowsingSession {
    /// Create a fresh context and open a blank page in it.
    pub async fn open(browser: Arc<Browser>) -> Result<Self, FetchError> {
        let context_id = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| browser_error("Failed to create browser context", e))?
            .result
            .browser_context_id;

        let target = CreateTargetParams::builder()
            .url("about:blank")
            .browser_context_id(context_id.clone())
            .build()
            .map_err(|e| browser_error("Invalid target parameters", e));

        let page = match target {
            Ok(target) => browser
                .new_page(target)
                .await
                .map_err(|e| browser_error("Failed to open page", e)),
            Err(e) => Err(e),
        };

        let page = match page {
            Ok(page) => page,
            Err(e) => {
                dispose_context(&browser, context_id).await;
                return Err(e);
            }
        };

        debug!("Opened browser context {:?}", context_id);

        Ok(Self {
            browser,
            context_id,
            page,
            interceptor: None,
            closed: false,
            runtime: tokio::runtime::Handle::current(),
        })
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Pause every request and let `filter` decide whether it proceeds.
    pub async fn intercept(&mut self, filter: RequestFilter) -> Result<(), FetchError> {
        let mut events = self
            .page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(|e| browser_error("Failed to listen for requests", e))?;

        let page = self.page.clone();
        self.interceptor = Some(tokio::spawn(async move {
            while let Some(event) = events.next().await {
                let kind = ResourceKind::from(&event.resource_type);
                let url = &event.request.url;

                let result = match filter.decide(kind, url) {
                    FilterDecision::Allow => page
                        .execute(ContinueRequestParams::new(event.request_id.clone()))
                        .await
                        .map(|_| ()),
                    FilterDecision::Block => {
                        debug!("Blocked {:?} request {}", kind, url);
                        page.execute(FailRequestParams::new(
                            event.request_id.clone(),
                            ErrorReason::BlockedByClient,
                        ))
                        .await
                        .map(|_| ())
                    }
                };

                if let Err(e) = result {
                    debug!("Failed to resolve paused request {}: {}", url, e);
                }
            }
        }));

        let pattern = RequestPattern::builder()
            .url_pattern("*")
            .request_stage(RequestStage::Request)
            .build();
        self.page
            .execute(EnableParams::builder().pattern(pattern).build())
            .await
            .map_err(|e| browser_error("Failed to enable request interception", e))?;

        Ok(())
    }

    /// Release the page and its context.
    pub async fn close(mut self) {
        self.closed = true;
        if let Some(task) = self.interceptor.take() {
            task.abort();
        }

        if let Err(e) = self.page.clone().close().await {
            warn!("Failed to close page: {}", e);
        }
        dispose_context(&self.browser, self.context_id.clone()).await;
    }
}

impl Drop for BrowsingSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Some(task) = self.interceptor.take() {
            task.abort();
        }

        let browser = self.browser.clone();
        let context_id = self.context_id.clone();
        let page = self.page.clone();
        self.runtime.spawn(async move {
            if let Err(e) = page.close().await {
                debug!("Failed to close abandoned page: {}", e);
            }
            dispose_context(&browser, context_id).await;
        });
    }
}

async fn dispose_context(browser: &Browser, context_id: BrowserContextId) {
    match browser
        .execute(DisposeBrowserContextParams::new(context_id.clone()))
        .await
    {
        Ok(_) => debug!("Disposed browser context {:?}", context_id),
        Err(e) => warn!("Failed to dispose browser context {:?}: {}", context_id, e),
    }
}
