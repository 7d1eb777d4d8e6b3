//! Plain HTTP fetcher.
//!
//! One GET with the session cookies and a desktop browser user agent. No
//! retries and no rendering; used when the rendered fetch yields nothing.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Client;
use tracing::{debug, info};

use super::{FetchSource, FetchedPage, PageFetcher, SessionCookies};
use crate::config::HttpConfig;
use crate::error::FetchError;

/// Desktop Chrome user agent sent when none is configured.
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Resolve the user agent from config; unset or blank means Chrome.
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config.map(str::trim) {
        None | Some("") => CHROME_USER_AGENT.to_string(),
        Some(custom) => custom.to_string(),
    }
}

/// Status and body of a plain GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainResponse {
    pub status_code: u16,
    pub body: String,
}

/// Fetches pages with a direct GET.
#[derive(Clone)]
pub struct PlainFetcher {
    client: Client,
}

impl PlainFetcher {
    pub fn new(http: &HttpConfig, cookies: &SessionCookies) -> Result<Self, FetchError> {
        let client = Client::builder()
            .cookie_provider(Arc::new(cookies.to_jar()))
            .user_agent(resolve_user_agent(http.user_agent.as_deref()))
            .timeout(http.timeout())
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { client })
    }

    /// GET `url` with extra headers.
    ///
    /// Non-success statuses are errors; the body of an error page is never
    /// handed to the parser.
    pub async fn fetch_plain(
        &self,
        url: &str,
        headers: &HeaderMap,
    ) -> Result<PlainResponse, FetchError> {
        debug!("GET {}", url);

        let request_error = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url)
            .headers(headers.clone())
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(request_error)?;
        debug!("GET {} -> {} ({} bytes)", url, status.as_u16(), body.len());

        Ok(PlainResponse {
            status_code: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl PageFetcher for PlainFetcher {
    fn name(&self) -> &'static str {
        "plain"
    }

    async fn fetch(&self, url: &str) -> Result<Option<FetchedPage>, FetchError> {
        info!("Fetching {} with plain HTTP", url);
        let response = self.fetch_plain(url, &HeaderMap::new()).await?;

        Ok(Some(FetchedPage {
            url: url.to_string(),
            markup: response.body,
            source: FetchSource::Plain,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BrowserCookie;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use reqwest::header::HeaderValue;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn header(headers: &AxumHeaders, name: &str) -> String {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    fn test_app() -> Router {
        Router::new()
            .route(
                "/thread",
                get(|headers: AxumHeaders| async move {
                    format!(
                        "<html><head><title>cookie={}</title></head></html>",
                        header(&headers, "cookie")
                    )
                }),
            )
            .route(
                "/headers",
                get(|headers: AxumHeaders| async move {
                    format!(
                        "{}|{}",
                        header(&headers, "user-agent"),
                        header(&headers, "x-requested-with")
                    )
                }),
            )
            .route("/missing", get(|| async { (StatusCode::NOT_FOUND, "gone") }))
    }

    fn session() -> SessionCookies {
        SessionCookies::new(vec![BrowserCookie {
            name: "xf_session".to_string(),
            value: "s3cret".to_string(),
            domain: "127.0.0.1".to_string(),
            path: "/".to_string(),
            secure: false,
            http_only: true,
        }])
    }

    #[test]
    fn test_resolve_user_agent() {
        assert_eq!(resolve_user_agent(None), CHROME_USER_AGENT);
        assert_eq!(resolve_user_agent(Some("  ")), CHROME_USER_AGENT);
        assert_eq!(resolve_user_agent(Some("MyBot/1.0")), "MyBot/1.0");
    }

    #[tokio::test]
    async fn test_fetch_plain_sends_session_cookies() {
        let base = serve(test_app()).await;
        let fetcher = PlainFetcher::new(&HttpConfig::default(), &session()).unwrap();

        let response = fetcher
            .fetch_plain(&format!("{}/thread", base), &HeaderMap::new())
            .await
            .unwrap();
        assert_eq!(response.status_code, 200);
        assert!(response.body.contains("cookie=xf_session=s3cret"));
    }

    #[tokio::test]
    async fn test_fetch_plain_sends_user_agent_and_extra_headers() {
        let base = serve(test_app()).await;
        let fetcher =
            PlainFetcher::new(&HttpConfig::default(), &SessionCookies::default()).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));

        let response = fetcher
            .fetch_plain(&format!("{}/headers", base), &headers)
            .await
            .unwrap();
        assert_eq!(
            response.body,
            format!("{}|XMLHttpRequest", CHROME_USER_AGENT)
        );
    }

    #[tokio::test]
    async fn test_fetch_plain_error_status() {
        let base = serve(test_app()).await;
        let fetcher =
            PlainFetcher::new(&HttpConfig::default(), &SessionCookies::default()).unwrap();

        let err = fetcher
            .fetch_plain(&format!("{}/missing", base), &HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_page_fetcher_wraps_plain_response() {
        let base = serve(test_app()).await;
        let fetcher = PlainFetcher::new(&HttpConfig::default(), &session()).unwrap();

        let page = fetcher
            .fetch(&format!("{}/thread", base))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(page.source, FetchSource::Plain);
        assert!(page.markup.starts_with("<html>"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_request_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let fetcher =
            PlainFetcher::new(&HttpConfig::default(), &SessionCookies::default()).unwrap();
        let err = fetcher
            .fetch_plain(&format!("http://{}/", addr), &HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }));
    }
}
