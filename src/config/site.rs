//! Site-specific knobs: origin, hosts and tag heuristics.

use serde::{Deserialize, Serialize};

/// Settings describing the forum being scraped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteConfig {
    /// Origin relative image URLs are resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Hosts whose images the rendered fetcher lets through.
    #[serde(default = "default_image_hosts")]
    pub image_hosts: Vec<String>,

    /// Suffixes removed from the document title (e.g. " | F95zone").
    #[serde(default = "default_title_suffixes")]
    pub title_suffixes: Vec<String>,

    /// Tag count below which a tag list is treated as incomplete.
    #[serde(default = "default_min_expected_tags")]
    pub min_expected_tags: usize,

    /// Literal substring marking one tag item in raw markup.
    #[serde(default = "default_tag_item_marker")]
    pub tag_item_marker: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            image_hosts: default_image_hosts(),
            title_suffixes: default_title_suffixes(),
            min_expected_tags: default_min_expected_tags(),
            tag_item_marker: default_tag_item_marker(),
        }
    }
}

impl SiteConfig {
    /// Apply environment variable overrides.
    ///
    /// - `THREADSCRAPE_BASE_URL` - Origin for relative URLs
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("THREADSCRAPE_BASE_URL") {
            if !val.trim().is_empty() {
                self.base_url = val.trim().to_string();
            }
        }
        self
    }
}

fn default_base_url() -> String {
    "https://f95zone.to".to_string()
}

fn default_image_hosts() -> Vec<String> {
    vec![
        "attachments.f95zone.to".to_string(),
        "preview.f95zone.to".to_string(),
    ]
}

fn default_title_suffixes() -> Vec<String> {
    vec![" | F95zone".to_string()]
}

pub const DEFAULT_MIN_EXPECTED_TAGS: usize = 35;

fn default_min_expected_tags() -> usize {
    DEFAULT_MIN_EXPECTED_TAGS
}

fn default_tag_item_marker() -> String {
    r#"class="tagItem""#.to_string()
}
