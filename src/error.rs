//! Error types for fetching and parsing thread pages.

use thiserror::Error;

/// Errors from acquiring page markup.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request failed for {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Browser error: {0}")]
    Browser(String),
    #[error("No markup obtained for {0}")]
    NoMarkup(String),
}

/// Errors from the metadata parser.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Document has no title")]
    MissingTitle,
}

/// Errors surfaced by a full scrape.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Errors from loading settings or cookie files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid TOML in {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid cookie file {path}: {source}")]
    Cookies {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
