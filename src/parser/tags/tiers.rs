//! The five tag extraction tiers, cheapest and most precise first.

use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

use super::{PageDocument, TagTier};
use crate::utils::{clean_fragment, collapse_whitespace, decode_entities};

/// Longest string still treated as a tag.
const MAX_TAG_CHARS: usize = 40;

/// Link texts of site chrome that tier 5 must never take for tags.
const CHROME_LINK_TEXTS: &[&str] = &[
    "menu",
    "forums",
    "top",
    "home",
    "latest",
    "what's new",
    "log in",
    "register",
    "search",
    "members",
    "tags",
    "more",
];

/// Whether a candidate string is shaped like a tag label.
pub fn looks_tag_like(s: &str) -> bool {
    let s = s.trim();
    let len = s.chars().count();
    if len == 0 || len > MAX_TAG_CHARS {
        return false;
    }
    if s.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let lower = s.to_lowercase();
    if lower.contains("://") || lower.contains("www.") {
        return false;
    }
    !s.contains(['@', '<', '>', '{', '}', '\n', ';', '='])
}

fn clean_candidates<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    raw.into_iter()
        .map(|s| collapse_whitespace(&decode_entities(&s)))
        .filter(|s| looks_tag_like(s))
        .collect()
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

// ---------------------------------------------------------------------------
// Tier 1: embedded script / structured data
// ---------------------------------------------------------------------------

static SCRIPT_ARRAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?([A-Za-z_$][\w$]*)["']?\s*[:=]\s*\[([^\[\]]*)\]"#).unwrap()
});

static SCRIPT_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["']?([A-Za-z_$][\w$]*)["']?\s*:\s*"([^"\\]*)""#).unwrap()
});

static QUOTED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"\\]*)"|'([^'\\]*)'"#).unwrap());

/// Whether a key name is about tags (`tags`, `tag_list`, `gameTags`),
/// as opposed to words that merely contain the letters (`stage`, `tagName`).
fn key_suggests_tags(key: &str) -> bool {
    if key.eq_ignore_ascii_case("tagname") {
        return false;
    }

    let mut words = Vec::new();
    let mut current = String::new();
    for c in key.chars() {
        if c == '_' || c == '-' || c == '$' {
            words.push(std::mem::take(&mut current));
        } else if c.is_uppercase() && !current.is_empty() {
            words.push(std::mem::take(&mut current));
            current.push(c);
        } else {
            current.push(c);
        }
    }
    words.push(current);

    words.iter().any(|w| {
        let w = w.to_lowercase();
        w == "tag" || w == "tags"
    })
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value.split(',').map(|s| s.trim().to_string())
}

/// Walk a JSON value collecting strings stored under tag-ish keys.
fn collect_json_tags(value: &serde_json::Value, under_tag_key: bool, out: &mut Vec<String>) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                let tag_key = key_suggests_tags(key);
                if under_tag_key && key == "name" {
                    if let Some(s) = child.as_str() {
                        out.push(s.to_string());
                    }
                    continue;
                }
                collect_json_tags(child, tag_key, out);
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                collect_json_tags(item, under_tag_key, out);
            }
        }
        serde_json::Value::String(s) if under_tag_key => out.extend(split_list(s)),
        _ => {}
    }
}

fn collect_script_tags(script: &str, out: &mut Vec<String>) {
    for caps in SCRIPT_ARRAY_RE.captures_iter(script) {
        if !key_suggests_tags(&caps[1]) {
            continue;
        }
        for quoted in QUOTED_RE.captures_iter(&caps[2]) {
            if let Some(m) = quoted.get(1).or_else(|| quoted.get(2)) {
                out.push(m.as_str().to_string());
            }
        }
    }

    for caps in SCRIPT_FIELD_RE.captures_iter(script) {
        if key_suggests_tags(&caps[1]) {
            out.extend(split_list(&caps[2]));
        }
    }
}

/// Tier 1: tags stored in embedded script or JSON blocks.
///
/// JSON blocks that fail to parse are skipped.
pub struct StructuredDataTier;

impl TagTier for StructuredDataTier {
    fn name(&self) -> &'static str {
        "structured-data"
    }

    fn extract(&self, page: &PageDocument<'_>) -> Vec<String> {
        let Ok(sel) = Selector::parse("script") else {
            return Vec::new();
        };

        let mut raw = Vec::new();
        for script in page.dom.select(&sel) {
            let body = script.text().collect::<String>();
            let body = body.trim();
            if body.is_empty() {
                continue;
            }

            let is_json = script
                .value()
                .attr("type")
                .is_some_and(|t| t.contains("json"));

            if is_json || body.starts_with('{') || body.starts_with('[') {
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
                    collect_json_tags(&value, false, &mut raw);
                }
                continue;
            }

            collect_script_tags(body, &mut raw);
        }

        clean_candidates(raw)
    }
}

// ---------------------------------------------------------------------------
// Tier 2: DOM query on the tag list
// ---------------------------------------------------------------------------

/// Tier 2: `.tagItem` elements inside `.js-tagList`, or site-wide when the
/// container is absent.
pub struct TagListDomTier;

impl TagTier for TagListDomTier {
    fn name(&self) -> &'static str {
        "tag-list-dom"
    }

    fn extract(&self, page: &PageDocument<'_>) -> Vec<String> {
        let (Ok(container_sel), Ok(item_sel)) =
            (Selector::parse(".js-tagList"), Selector::parse(".tagItem"))
        else {
            return Vec::new();
        };

        let containers: Vec<_> = page.dom.select(&container_sel).collect();
        let raw: Vec<String> = if containers.is_empty() {
            page.dom.select(&item_sel).map(element_text).collect()
        } else {
            containers
                .into_iter()
                .flat_map(|c| c.select(&item_sel).map(element_text).collect::<Vec<_>>())
                .collect()
        };

        clean_candidates(raw)
    }
}

// ---------------------------------------------------------------------------
// Tier 3: regex over the tag list's textual span
// ---------------------------------------------------------------------------

static TAG_LIST_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<([a-z][a-z0-9]*)\b[^>]*\bclass\s*=\s*["'][^"']*\bjs-tagList\b[^"']*["'][^>]*>"#)
        .unwrap()
});

static TAG_ITEM_ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*\bclass\s*=\s*["'][^"']*\btagItem\b[^"']*["'][^>]*>(.*?)</a\s*>"#)
        .unwrap()
});

/// Text of an element from just after its opening tag to its balanced
/// closing tag, or to the end of the markup if it never closes.
pub(crate) fn element_span<'a>(raw: &'a str, content_start: usize, tag: &str) -> &'a str {
    let Ok(boundary) = Regex::new(&format!(r"(?i)<(/?){}\b[^>]*?(/?)>", regex::escape(tag)))
    else {
        return &raw[content_start..];
    };

    let mut depth = 1usize;
    for caps in boundary.captures_iter(&raw[content_start..]) {
        let Some(whole) = caps.get(0) else { continue };
        let closing = caps.get(1).is_some_and(|m| !m.is_empty());
        let self_closing = caps.get(2).is_some_and(|m| !m.is_empty());

        if closing {
            depth -= 1;
            if depth == 0 {
                return &raw[content_start..content_start + whole.start()];
            }
        } else if !self_closing {
            depth += 1;
        }
    }

    &raw[content_start..]
}

/// Tier 3: re-extract tag anchors straight from the tag list's raw span.
pub struct TagListSpanTier;

impl TagTier for TagListSpanTier {
    fn name(&self) -> &'static str {
        "tag-list-span"
    }

    fn extract(&self, page: &PageDocument<'_>) -> Vec<String> {
        let mut raw = Vec::new();

        for open in TAG_LIST_OPEN_RE.captures_iter(page.raw) {
            let (Some(whole), Some(tag)) = (open.get(0), open.get(1)) else {
                continue;
            };
            let span = element_span(page.raw, whole.end(), tag.as_str());
            raw.extend(
                TAG_ITEM_ANCHOR_RE
                    .captures_iter(span)
                    .map(|c| clean_fragment(&c[1])),
            );
        }

        clean_candidates(raw)
    }
}

// ---------------------------------------------------------------------------
// Tier 4: whole-document regex over tag-shaped elements
// ---------------------------------------------------------------------------

const TAG_ELEMENT_KINDS: &[&str] = &["a", "span", "li", "div"];

static TAG_ELEMENT_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    TAG_ELEMENT_KINDS
        .iter()
        .map(|kind| {
            Regex::new(&format!(
                r#"(?is)<{kind}\b[^>]*\bclass\s*=\s*["'][^"']*\b(?:tagItem|tag-item|tag)\b[^"']*["'][^>]*>(.*?)</{kind}\s*>"#
            ))
            .unwrap()
        })
        .collect()
});

/// Tier 4: scan the whole document for tag-item shaped elements of several
/// element kinds, keeping document order.
pub struct DocumentRegexTier;

impl TagTier for DocumentRegexTier {
    fn name(&self) -> &'static str {
        "document-regex"
    }

    fn extract(&self, page: &PageDocument<'_>) -> Vec<String> {
        let mut found: Vec<(usize, String)> = TAG_ELEMENT_RES
            .iter()
            .flat_map(|re| {
                re.captures_iter(page.raw)
                    .filter_map(|c| {
                        let start = c.get(0)?.start();
                        Some((start, clean_fragment(c.get(1)?.as_str())))
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        found.sort_by_key(|(pos, _)| *pos);

        clean_candidates(found.into_iter().map(|(_, text)| text))
    }
}

// ---------------------------------------------------------------------------
// Tier 5: generic tag-like anchors
// ---------------------------------------------------------------------------

/// Tier 5: anchors in tag-like containers or pointing at tag pages, minus
/// site navigation.
pub struct GenericAnchorTier;

impl TagTier for GenericAnchorTier {
    fn name(&self) -> &'static str {
        "generic-anchor"
    }

    fn extract(&self, page: &PageDocument<'_>) -> Vec<String> {
        let Ok(sel) = Selector::parse(r#"[class*="tag"] a, a[href*="/tags/"], a[rel="tag"]"#)
        else {
            return Vec::new();
        };

        let raw = page
            .dom
            .select(&sel)
            .map(element_text)
            .filter(|text| !CHROME_LINK_TEXTS.contains(&text.to_lowercase().as_str()));

        clean_candidates(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn run(tier: &dyn TagTier, raw: &str) -> Vec<String> {
        let dom = Html::parse_document(raw);
        tier.extract(&PageDocument::new(raw, &dom))
    }

    #[test]
    fn test_looks_tag_like() {
        assert!(looks_tag_like("3dcg"));
        assert!(looks_tag_like("Male protagonist"));
        assert!(!looks_tag_like(""));
        assert!(!looks_tag_like("12345"));
        assert!(!looks_tag_like("https://example.com"));
        assert!(!looks_tag_like("www.example.com"));
        assert!(!looks_tag_like("@someone"));
        assert!(!looks_tag_like(&"x".repeat(41)));
    }

    #[test]
    fn test_key_suggests_tags() {
        assert!(key_suggests_tags("tags"));
        assert!(key_suggests_tags("gameTags"));
        assert!(key_suggests_tags("tag_list"));
        assert!(key_suggests_tags("Tag"));
        assert!(!key_suggests_tags("stage"));
        assert!(!key_suggests_tags("tagName"));
        assert!(!key_suggests_tags("hashtagger"));
    }

    #[test]
    fn test_structured_data_json_and_script() {
        let raw = r#"<html><head>
            <script type="application/ld+json">{"tags":["Sandbox","3dcg"]}</script>
            <script type="application/ld+json">{"game":{"tag_list":[{"name":"Romance"}]}}</script>
            <script>var threadData = { gameTags: ["Humor", 'Male protagonist'], stage: ["no"] }; el.tagName = "DIV";</script>
            <script type="application/json">{ not json</script>
        </head></html>"#;

        assert_eq!(
            run(&StructuredDataTier, raw),
            vec!["Sandbox", "3dcg", "Romance", "Humor", "Male protagonist"]
        );
    }

    #[test]
    fn test_structured_data_comma_field() {
        let raw = r#"<script>window.meta = {"tags": "Harem, Fantasy , https://x.y"};</script>"#;
        assert_eq!(run(&StructuredDataTier, raw), vec!["Harem", "Fantasy"]);
    }

    #[test]
    fn test_tag_list_dom_scoped_to_container() {
        let raw = r#"<body>
            <span class="js-tagList">
                <a href="/tags/3dcg/" class="tagItem" dir="auto">3dcg</a>
                <a href="/tags/romance/" class="tagItem" dir="auto">romance &amp; drama</a>
            </span>
            <a class="tagItem">outside</a>
        </body>"#;
        assert_eq!(run(&TagListDomTier, raw), vec!["3dcg", "romance & drama"]);
    }

    #[test]
    fn test_tag_list_dom_site_wide_fallback() {
        let raw = r#"<div><a class="tagItem">one</a><a class="tagItem">two</a></div>"#;
        assert_eq!(run(&TagListDomTier, raw), vec!["one", "two"]);
    }

    #[test]
    fn test_element_span_balances_nested_tags() {
        let raw = r#"<span class="js-tagList"><span>a</span><span/>b</span>after</span>"#;
        let start = raw.find('>').unwrap() + 1;
        assert_eq!(element_span(raw, start, "span"), "<span>a</span><span/>b");
    }

    #[test]
    fn test_tag_list_span_strips_nested_markup() {
        let raw = r#"<dd><span class="js-tagList">
            <a href="/tags/a/" class="tagItem"><span>big</span> &amp; tall</a>
            <span class="inner"><a class="tagItem" href="/tags/b/">dark</a></span>
            </span></dd>
            <a class="tagItem">not in list</a>"#;
        assert_eq!(run(&TagListSpanTier, raw), vec!["big & tall", "dark"]);
    }

    #[test]
    fn test_document_regex_keeps_order_across_kinds() {
        let raw = r#"<li class="tag">first</li>
            <a class="tagItem">second</a>
            <span class="tag-item">third</span>
            <div class="tags">ignored</div>"#;
        assert_eq!(
            run(&DocumentRegexTier, raw),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn test_generic_anchor_filters_chrome() {
        let raw = r#"<nav class="p-nav tagged-nav"><a href="/">Home</a><a href="/forums/">Forums</a></nav>
            <div class="tag-cloud"><a href="/x/">Sci-fi</a></div>
            <a href="/tags/vn/">Visual novel</a>
            <a rel="tag" href="/t/1">Top</a>"#;
        assert_eq!(run(&GenericAnchorTier, raw), vec!["Sci-fi", "Visual novel"]);
    }
}
