//! threadscrape - catalog metadata extraction from forum thread pages.
//!
//! Thread pages mix server-rendered HTML with tag lists filled in by
//! client-side script. Pages are fetched through a real browser when
//! possible, with a plain HTTP fallback, and the markup is run through a
//! cascading parser that yields a [`GameMetadata`] record.

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod utils;

pub use config::Settings;
pub use error::{ConfigError, FetchError, ParseError, ScrapeError};
pub use fetch::{PageFetcher, SessionCookies};
pub use models::{Engine, GameMetadata, Status, TagSet};
pub use orchestrator::ThreadScraper;
pub use parser::{parse_thread, MetadataParser};
