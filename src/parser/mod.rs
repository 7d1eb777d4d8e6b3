//! Metadata parser for thread pages.
//!
//! A pure function from markup to a [`GameMetadata`] record. No network
//! access happens here; identical markup always yields an identical record.

pub mod classify;
pub mod image;
pub mod tags;
pub mod title;
pub mod version;

use scraper::Html;
use tracing::debug;
use url::Url;

use crate::config::SiteConfig;
use crate::error::ParseError;
use crate::models::GameMetadata;

pub use classify::classify;
pub use image::{normalize_image_url, resolve_image};
pub use tags::{PageDocument, TagExtractor, TagReport, TagTier};
pub use title::{extract_title_text, parse_title, TitleParts, TitleTier};

/// Parses thread markup into metadata records.
pub struct MetadataParser {
    title_suffixes: Vec<String>,
    base: Option<Url>,
    tags: TagExtractor,
}

impl Default for MetadataParser {
    fn default() -> Self {
        Self::new(&SiteConfig::default())
    }
}

impl MetadataParser {
    pub fn new(site: &SiteConfig) -> Self {
        Self {
            title_suffixes: site.title_suffixes.clone(),
            base: Url::parse(&site.base_url).ok(),
            tags: TagExtractor::new(site),
        }
    }

    /// Replace the tag extractor, e.g. with a custom tier list.
    pub fn with_tag_extractor(mut self, tags: TagExtractor) -> Self {
        self.tags = tags;
        self
    }

    /// Parse a thread page.
    ///
    /// Fails only when the document has no title-equivalent text at all;
    /// every other missing field degrades to `None` or an empty tag set.
    pub fn parse(&self, markup: &str, source_url: &str) -> Result<GameMetadata, ParseError> {
        let dom = Html::parse_document(markup);

        let title = extract_title_text(&dom).ok_or(ParseError::MissingTitle)?;
        let title = title::strip_site_suffix(&title, &self.title_suffixes);
        let parts = parse_title(&title);
        let (status, engine) = classify(&title);

        // Relative image URLs resolve against the thread itself when it is
        // absolute, otherwise against the configured origin.
        let base = Url::parse(source_url).ok().or_else(|| self.base.clone());
        let image = resolve_image(&dom, base.as_ref());

        let report = self.tags.run(&PageDocument::new(markup, &dom));

        debug!(
            "Parsed {:?} ({:?} tier): {} tags via {:?}, image {}",
            parts.name,
            parts.tier,
            report.tags.len(),
            report.tiers_run,
            image.is_some()
        );

        Ok(GameMetadata {
            name: parts.name,
            version: parts.version,
            developer: parts.developer,
            status,
            engine,
            tags: report.tags,
            image,
            source_url: source_url.to_string(),
        })
    }
}

/// Parse a thread page with default site settings.
pub fn parse_thread(markup: &str, source_url: &str) -> Result<GameMetadata, ParseError> {
    MetadataParser::default().parse(markup, source_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Engine, Status, UNKNOWN_TITLE};

    const THREAD_URL: &str = "https://f95zone.to/threads/a-family-venture.1234/";

    fn page(title: &str, body: &str) -> String {
        format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, body
        )
    }

    #[test]
    fn test_parse_full_record() {
        let markup = page(
            "Ren&#039;Py - Completed - A Family Venture [v0.09] [DevStudio] | F95zone",
            r#"<div class="message-body">
                <img class="bbImage" src="/data/thumb/cover.png"
                     data-url="https://preview.f95zone.to/2024/thumb/cover.png">
            </div>
            <span class="js-tagList">
                <a class="tagItem" href="/tags/3dcg/">3dcg</a>
                <a class="tagItem" href="/tags/sandbox/">Sandbox</a>
            </span>"#,
        );

        let meta = parse_thread(&markup, THREAD_URL).unwrap();
        assert_eq!(meta.name, "A Family Venture");
        assert_eq!(meta.version.as_deref(), Some("v0.09"));
        assert_eq!(meta.developer.as_deref(), Some("DevStudio"));
        assert_eq!(meta.status, Status::Completed);
        assert_eq!(meta.engine, Engine::RenPy);
        assert_eq!(meta.tags.as_slice(), &["3dcg", "Sandbox"]);
        assert_eq!(
            meta.image.as_deref(),
            Some("https://attachments.f95zone.to/2024/cover.png")
        );
        assert_eq!(meta.source_url, THREAD_URL);
    }

    #[test]
    fn test_missing_title_is_an_error() {
        let markup = "<html><body><p>Nothing here</p></body></html>";
        assert_eq!(
            parse_thread(markup, THREAD_URL),
            Err(ParseError::MissingTitle)
        );
    }

    #[test]
    fn test_heading_used_when_title_absent() {
        let markup = r#"<html><body><h1 class="p-title-value">Quiet Town [v1.2] [Hush]</h1></body></html>"#;
        let meta = parse_thread(markup, THREAD_URL).unwrap();
        assert_eq!(meta.name, "Quiet Town");
        assert_eq!(meta.version.as_deref(), Some("v1.2"));
        assert_eq!(meta.developer.as_deref(), Some("Hush"));
    }

    #[test]
    fn test_sparse_page_degrades_gracefully() {
        let meta = parse_thread(&page("[HOT]", ""), THREAD_URL).unwrap();
        assert_eq!(meta.name, UNKNOWN_TITLE);
        assert_eq!(meta.version, None);
        assert_eq!(meta.developer, None);
        assert_eq!(meta.status, Status::Ongoing);
        assert_eq!(meta.engine, Engine::Other);
        assert!(meta.tags.is_empty());
        assert_eq!(meta.image, None);
    }

    #[test]
    fn test_relative_image_uses_site_origin_for_relative_source() {
        let markup = page(
            "Game [v1] [Dev]",
            r#"<img class="bbImage" src="/attachments/cover.jpg">"#,
        );
        let meta = parse_thread(&markup, "threads/game.1/").unwrap();
        assert_eq!(
            meta.image.as_deref(),
            Some("https://f95zone.to/attachments/cover.jpg")
        );
    }

    #[test]
    fn test_parse_is_idempotent() {
        let markup = page(
            "Unity - Lost Shores [Final] [Moon Games]",
            r#"<a class="tagItem">a</a><a class="tagItem">b</a>"#,
        );
        let parser = MetadataParser::default();
        assert_eq!(
            parser.parse(&markup, THREAD_URL).unwrap(),
            parser.parse(&markup, THREAD_URL).unwrap()
        );
    }
}
