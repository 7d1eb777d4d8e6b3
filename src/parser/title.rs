//! Title extraction and the three-tier title parse.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

use super::version::{
    bracket_groups, looks_like_version, normalize_version, resolve_developer, resolve_version,
    strip_bracket_groups,
};
use crate::models::UNKNOWN_TITLE;
use crate::utils::collapse_whitespace;

/// `prefix - name [version] [developer]`, prefix optional and greedy up to
/// the last ` - ` before the first bracket.
static STRUCTURED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?P<prefix>[^\[\]]*)\s-\s)?(?P<name>[^\[\]]+?)\s*\[(?P<version>[^\[\]]+)\]\s*\[(?P<developer>[^\[\]]+)\]\s*$",
    )
    .unwrap()
});

/// Engine names some titles prepend to the game name.
static ENGINE_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:ren'?py|rpgm|rpg\s*maker|unity|unreal(?:\s+engine)?|ue[45]|flash|html|qsp|others?)(?:\s+-\s+|\s+)",
    )
    .unwrap()
});

/// Which title tier produced the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleTier {
    Structured,
    BracketGroups,
    Raw,
    Unknown,
}

/// Result of parsing a title string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleParts {
    pub name: String,
    pub version: Option<String>,
    pub developer: Option<String>,
    pub tier: TitleTier,
}

/// Find the title-equivalent text of a document.
///
/// Checks `<title>`, then the `og:title` meta tag, then the thread heading.
/// Text and attribute values arrive entity-decoded from the HTML parser.
pub fn extract_title_text(doc: &Html) -> Option<String> {
    let candidates = [
        ("title", None),
        (r#"meta[property="og:title"]"#, Some("content")),
        ("h1.p-title-value", None),
    ];

    for (selector, attr) in candidates {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        for el in doc.select(&sel) {
            let raw = match attr {
                Some(attr) => el.value().attr(attr).unwrap_or_default().to_string(),
                None => el.text().collect::<Vec<_>>().join(" "),
            };
            let text = collapse_whitespace(&raw);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }

    None
}

/// Remove the first matching site suffix (e.g. " | F95zone").
pub fn strip_site_suffix(title: &str, suffixes: &[String]) -> String {
    for suffix in suffixes {
        let suffix = suffix.trim();
        if suffix.is_empty() {
            continue;
        }
        if let Some(stripped) = title.trim_end().strip_suffix(suffix) {
            return stripped.trim().to_string();
        }
    }
    title.trim().to_string()
}

/// Strip a leading engine name from a game name, unless nothing would remain.
pub fn strip_engine_prefix(name: &str) -> String {
    let stripped = ENGINE_PREFIX_RE.replace(name, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        name.trim().to_string()
    } else {
        stripped.to_string()
    }
}

/// Parse a cleaned title into name, version and developer.
pub fn parse_title(title: &str) -> TitleParts {
    let title = collapse_whitespace(title);

    if let Some(parts) = parse_structured(&title) {
        return finish(parts);
    }
    if let Some(parts) = parse_bracket_groups(&title) {
        return finish(parts);
    }

    let raw = collapse_whitespace(&strip_bracket_groups(&title));
    if !raw.is_empty() {
        let groups = bracket_groups(&title);
        return finish(TitleParts {
            name: raw,
            version: resolve_version(&groups),
            developer: None,
            tier: TitleTier::Raw,
        });
    }

    TitleParts {
        name: UNKNOWN_TITLE.to_string(),
        version: None,
        developer: None,
        tier: TitleTier::Unknown,
    }
}

fn parse_structured(title: &str) -> Option<TitleParts> {
    let caps = STRUCTURED_RE.captures(title)?;
    let name = caps.name("name")?.as_str().trim();
    let version = caps.name("version")?.as_str();
    let developer = caps.name("developer")?.as_str().trim();

    // A version slot that holds something else means the title does not
    // follow the layout; let the bracket tier sort it out.
    if name.is_empty() || !looks_like_version(version) {
        return None;
    }

    Some(TitleParts {
        name: name.to_string(),
        version: normalize_version(version),
        developer: Some(developer.to_string()).filter(|d| !d.is_empty()),
        tier: TitleTier::Structured,
    })
}

fn parse_bracket_groups(title: &str) -> Option<TitleParts> {
    let groups = bracket_groups(title);
    if groups.is_empty() {
        return None;
    }

    let head = title.split('[').next().unwrap_or_default();
    let name = head.rsplit(" - ").next().unwrap_or(head).trim();
    if name.is_empty() {
        return None;
    }

    Some(TitleParts {
        name: name.to_string(),
        version: resolve_version(&groups),
        developer: resolve_developer(&groups),
        tier: TitleTier::BracketGroups,
    })
}

fn finish(mut parts: TitleParts) -> TitleParts {
    parts.name = strip_engine_prefix(&parts.name);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_title() {
        let parts = parse_title("Ren'Py - A Family Venture [v0.09] [DevStudio]");
        assert_eq!(parts.name, "A Family Venture");
        assert_eq!(parts.version.as_deref(), Some("v0.09"));
        assert_eq!(parts.developer.as_deref(), Some("DevStudio"));
        assert_eq!(parts.tier, TitleTier::Structured);
    }

    #[test]
    fn test_structured_title_with_several_prefix_labels() {
        let parts = parse_title("Unity - Completed - Lost Shores [Final] [Moon Games]");
        assert_eq!(parts.name, "Lost Shores");
        assert_eq!(parts.version.as_deref(), Some("vFinal"));
        assert_eq!(parts.developer.as_deref(), Some("Moon Games"));
    }

    #[test]
    fn test_no_brackets() {
        let parts = parse_title("Summer Nights");
        assert_eq!(parts.name, "Summer Nights");
        assert_eq!(parts.version, None);
        assert_eq!(parts.developer, None);
        assert_eq!(parts.tier, TitleTier::Raw);
    }

    #[test]
    fn test_bracket_tier_with_extra_groups() {
        let parts = parse_title("RPGM - Dungeon Days [Ep. 2] [v0.3] [Fixed] [Crimson Dev]");
        assert_eq!(parts.tier, TitleTier::BracketGroups);
        assert_eq!(parts.name, "Dungeon Days");
        assert_eq!(parts.version.as_deref(), Some("v0.3"));
        assert_eq!(parts.developer.as_deref(), Some("Crimson Dev"));
    }

    #[test]
    fn test_structured_rejects_swapped_groups() {
        let parts = parse_title("Game Title [Studio X] [v1.2]");
        assert_eq!(parts.tier, TitleTier::BracketGroups);
        assert_eq!(parts.version.as_deref(), Some("v1.2"));
        assert_eq!(parts.developer.as_deref(), Some("Studio X"));
    }

    #[test]
    fn test_single_version_group() {
        let parts = parse_title("Tiny Game [v1.0]");
        assert_eq!(parts.name, "Tiny Game");
        assert_eq!(parts.version.as_deref(), Some("v1.0"));
        assert_eq!(parts.developer, None);
    }

    #[test]
    fn test_raw_fallback_strips_groups() {
        let parts = parse_title("[HOT] [v2]");
        assert_eq!(parts.tier, TitleTier::Unknown);
        assert_eq!(parts.name, UNKNOWN_TITLE);

        let parts = parse_title("[Pinned] Something");
        assert_eq!(parts.tier, TitleTier::Raw);
        assert_eq!(parts.name, "Something");
    }

    #[test]
    fn test_engine_prefix_stripped() {
        assert_eq!(strip_engine_prefix("Ren'Py Summer Camp"), "Summer Camp");
        assert_eq!(strip_engine_prefix("Ren'Py - Summer Camp"), "Summer Camp");
        assert_eq!(strip_engine_prefix("Unity"), "Unity");
        assert_eq!(strip_engine_prefix("Unityville"), "Unityville");
    }

    #[test]
    fn test_strip_site_suffix() {
        let suffixes = vec![" | F95zone".to_string()];
        assert_eq!(
            strip_site_suffix("Game [v1] [Dev] | F95zone", &suffixes),
            "Game [v1] [Dev]"
        );
        assert_eq!(strip_site_suffix("Game", &suffixes), "Game");
    }

    #[test]
    fn test_extract_title_text_decodes_entities() {
        let doc = Html::parse_document(
            "<html><head><title>Ren&#039;Py - Game [v1] [Dev]</title></head></html>",
        );
        assert_eq!(
            extract_title_text(&doc).as_deref(),
            Some("Ren'Py - Game [v1] [Dev]")
        );
    }

    #[test]
    fn test_extract_title_text_decodes_once() {
        let doc = Html::parse_document(
            r#"<html><head><title>Tom &amp;amp; Jerry [v1] [Dev]</title></head></html>"#,
        );
        assert_eq!(
            extract_title_text(&doc).as_deref(),
            Some("Tom &amp; Jerry [v1] [Dev]")
        );

        let doc = Html::parse_document(
            r#"<html><head><meta property="og:title" content="Tom &amp;amp; Jerry"></head></html>"#,
        );
        assert_eq!(extract_title_text(&doc).as_deref(), Some("Tom &amp; Jerry"));
    }

    #[test]
    fn test_extract_title_text_falls_back_to_og_title() {
        let doc = Html::parse_document(
            r#"<html><head><title> </title><meta property="og:title" content="Fallback [v2] [Dev]"></head></html>"#,
        );
        assert_eq!(
            extract_title_text(&doc).as_deref(),
            Some("Fallback [v2] [Dev]")
        );
    }

    #[test]
    fn test_extract_title_text_missing() {
        let doc = Html::parse_document("<html><body><p>nothing</p></body></html>");
        assert_eq!(extract_title_text(&doc), None);
    }
}
