//! Data model for extracted catalog records.

mod metadata;
mod tags;

pub use metadata::{Engine, GameMetadata, Status, UNKNOWN_TITLE};
pub use tags::TagSet;
