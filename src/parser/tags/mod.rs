//! Escalating tag extraction.
//!
//! Tag lists are partly client-rendered, so a single query under-reports.
//! Tags are gathered by an ordered list of independent tiers sharing one
//! accumulator. A tier only runs while the accumulator is short of the
//! expected count; once a tier reaches it, later tiers are skipped.
//!
//! The expected count is the number of literal tag-item markers in the raw
//! markup. Live DOM counts can under-report, the raw text does not.

mod tiers;

pub use tiers::{
    looks_tag_like, DocumentRegexTier, GenericAnchorTier, StructuredDataTier, TagListDomTier,
    TagListSpanTier,
};

use scraper::Html;
use tracing::debug;

use crate::config::{SiteConfig, DEFAULT_MIN_EXPECTED_TAGS};
use crate::models::TagSet;

/// Raw markup together with its parsed DOM.
pub struct PageDocument<'a> {
    pub raw: &'a str,
    pub dom: &'a Html,
}

impl<'a> PageDocument<'a> {
    pub fn new(raw: &'a str, dom: &'a Html) -> Self {
        Self { raw, dom }
    }
}

/// One tag extraction strategy.
pub trait TagTier: Send + Sync {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Candidate tags in document order. Duplicates are fine.
    fn extract(&self, page: &PageDocument<'_>) -> Vec<String>;
}

/// Outcome of a tag extraction run.
#[derive(Debug, Clone)]
pub struct TagReport {
    pub tags: TagSet,
    pub expected: usize,
    /// Names of the tiers that ran, in order.
    pub tiers_run: Vec<&'static str>,
}

/// Count literal tag-item markers in raw markup.
pub fn count_tag_markers(raw: &str, marker: &str) -> usize {
    if marker.is_empty() {
        return 0;
    }
    raw.matches(marker).count()
}

/// Runs tag tiers in order with early exit.
pub struct TagExtractor {
    tiers: Vec<Box<dyn TagTier>>,
    marker: String,
    min_expected: usize,
}

impl Default for TagExtractor {
    fn default() -> Self {
        Self::new(&SiteConfig::default())
    }
}

impl TagExtractor {
    /// The standard five tiers.
    pub fn new(site: &SiteConfig) -> Self {
        Self::with_tiers(site, Self::standard_tiers())
    }

    /// Custom tier list, e.g. for instrumentation.
    pub fn with_tiers(site: &SiteConfig, tiers: Vec<Box<dyn TagTier>>) -> Self {
        Self {
            tiers,
            marker: site.tag_item_marker.clone(),
            min_expected: if site.min_expected_tags == 0 {
                DEFAULT_MIN_EXPECTED_TAGS
            } else {
                site.min_expected_tags
            },
        }
    }

    pub fn standard_tiers() -> Vec<Box<dyn TagTier>> {
        vec![
            Box::new(StructuredDataTier),
            Box::new(TagListDomTier),
            Box::new(TagListSpanTier),
            Box::new(DocumentRegexTier),
            Box::new(GenericAnchorTier),
        ]
    }

    /// Expected tag count for a page.
    ///
    /// Falls back to the minimum threshold when the page carries no markers,
    /// so every tier gets its chance.
    pub fn expected_count(&self, raw: &str) -> usize {
        match count_tag_markers(raw, &self.marker) {
            0 => self.min_expected,
            n => n,
        }
    }

    pub fn run(&self, page: &PageDocument<'_>) -> TagReport {
        let expected = self.expected_count(page.raw);
        let mut tags = TagSet::new();
        let mut tiers_run = Vec::new();

        for tier in &self.tiers {
            if tags.len() >= expected {
                break;
            }
            let added = tags.extend(tier.extract(page));
            tiers_run.push(tier.name());
            debug!(
                "Tag tier {} added {} (total {}/{})",
                tier.name(),
                added,
                tags.len(),
                expected
            );
        }

        TagReport {
            tags,
            expected,
            tiers_run,
        }
    }
}
