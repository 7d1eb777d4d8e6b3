//! Scrape orchestration: rendered fetch first, plain fetch as fallback,
//! then the metadata parser on whatever markup came back.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Settings;
use crate::error::{FetchError, ScrapeError};
use crate::fetch::{
    FetchedPage, PageFetcher, PlainFetcher, RenderedFetcher, SessionCookies,
};
use crate::models::GameMetadata;
use crate::parser::MetadataParser;

/// Extracts metadata for one thread URL at a time.
///
/// Calls share the fetchers (and with them the browser process) but nothing
/// mutable, so one scraper can serve concurrent scrapes.
pub struct ThreadScraper {
    rendered: Option<Arc<dyn PageFetcher>>,
    plain: Arc<dyn PageFetcher>,
    parser: MetadataParser,
}

impl ThreadScraper {
    pub fn new(
        rendered: Option<Arc<dyn PageFetcher>>,
        plain: Arc<dyn PageFetcher>,
        parser: MetadataParser,
    ) -> Self {
        Self {
            rendered,
            plain,
            parser,
        }
    }

    /// Build the standard fetchers from settings.
    ///
    /// The rendered fetcher is skipped when disabled in settings or when
    /// browser support is not compiled in.
    pub fn from_settings(
        settings: &Settings,
        cookies: SessionCookies,
    ) -> Result<Self, FetchError> {
        let plain: Arc<dyn PageFetcher> = Arc::new(PlainFetcher::new(&settings.http, &cookies)?);

        let rendered: Option<Arc<dyn PageFetcher>> =
            if settings.browser.enabled && cfg!(feature = "browser") {
                Some(Arc::new(RenderedFetcher::new(
                    settings.browser.clone(),
                    &settings.site,
                    cookies,
                )))
            } else {
                None
            };

        Ok(Self::new(rendered, plain, MetadataParser::new(&settings.site)))
    }

    /// Acquire markup for `url`, preferring the rendered page.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        if let Some(rendered) = &self.rendered {
            match rendered.fetch(url).await {
                Ok(Some(page)) => return Ok(page),
                Ok(None) => warn!("{} fetch got no page for {}", rendered.name(), url),
                Err(e) => warn!("{} fetch failed for {}: {}", rendered.name(), url, e),
            }
            info!("Falling back to {} fetch for {}", self.plain.name(), url);
        }

        self.plain
            .fetch(url)
            .await?
            .ok_or_else(|| FetchError::NoMarkup(url.to_string()))
    }

    /// Fetch and parse one thread.
    pub async fn scrape(&self, url: &str) -> Result<GameMetadata, ScrapeError> {
        let page = self.fetch(url).await?;
        info!(
            "Parsing {} ({} bytes, {})",
            url,
            page.markup.len(),
            page.source.as_str()
        );
        Ok(self.parser.parse(&page.markup, url)?)
    }
}
