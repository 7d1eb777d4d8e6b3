//! Shared text utilities.

pub mod html;

pub use html::{clean_fragment, collapse_whitespace, decode_entities, strip_tags};
