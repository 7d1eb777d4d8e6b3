//! Version and developer resolution from bracket groups.
//!
//! Rules:
//! - version: the LAST bracket group that looks like a version or release
//!   marker wins, since version markers sit closest to the end of a title.
//! - developer: the LAST bracket group that does not look like a version.

use regex::Regex;
use std::sync::LazyLock;

static BRACKET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\[\]]*)\]").unwrap());

static V_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:version\s*|v\s*)[\d.]").unwrap());

static DOTTED_NUMERIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)+[a-z0-9\-]*$").unwrap());

static SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:arc|chapter|ch\.?|episode|ep\.?|season|part)\s*\d+").unwrap()
});

static STRIP_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:version\s*|v\s*)([\d.])").unwrap());

/// Release-state words accepted as a version marker.
const RELEASE_WORDS: &[&str] = &[
    "final",
    "completed",
    "complete",
    "demo",
    "alpha",
    "beta",
    "prologue",
    "remastered",
];

/// All non-empty bracket group contents in order of appearance.
pub fn bracket_groups(title: &str) -> Vec<String> {
    BRACKET_RE
        .captures_iter(title)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Remove every bracket group from a title.
pub fn strip_bracket_groups(title: &str) -> String {
    BRACKET_RE.replace_all(title, " ").into_owned()
}

/// Whether a bracket token looks like a version or release marker.
pub fn looks_like_version(token: &str) -> bool {
    let token = token.trim();
    if token.is_empty() {
        return false;
    }
    let lower = token.to_lowercase();

    V_PREFIX_RE.is_match(token)
        || DOTTED_NUMERIC_RE.is_match(&lower)
        || RELEASE_WORDS.contains(&lower.as_str())
        || SEGMENT_RE.is_match(token)
}

/// Normalize a version token to its `v`-prefixed form.
pub fn normalize_version(token: &str) -> Option<String> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    let bare = STRIP_PREFIX_RE.replace(token, "$1");
    let bare = bare.trim();
    if bare.is_empty() {
        return None;
    }
    Some(format!("v{}", bare))
}

/// Pick the version from bracket groups (last valid group wins).
pub fn resolve_version(groups: &[String]) -> Option<String> {
    groups
        .iter()
        .rev()
        .find(|g| looks_like_version(g))
        .and_then(|g| normalize_version(g))
}

/// Pick the developer from bracket groups (last non-version group wins).
pub fn resolve_developer(groups: &[String]) -> Option<String> {
    groups
        .iter()
        .rev()
        .find(|g| !looks_like_version(g))
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
}
