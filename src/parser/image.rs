//! Cover image resolution and URL normalization.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

/// Host prefix of downscaled previews and the canonical attachment host.
const PREVIEW_PREFIX: &str = "preview.";
const ATTACHMENT_PREFIX: &str = "attachments.";

/// Find the cover image of a thread, as a normalized absolute URL.
///
/// Tried in order: the lightbox image (full-resolution `data-url` over
/// `data-src` over the displayed `src`), a generic image in the post body,
/// then the page-level preview meta tag.
pub fn resolve_image(doc: &Html, base: Option<&Url>) -> Option<String> {
    let candidate = lightbox_image(doc)
        .or_else(|| embedded_image(doc))
        .or_else(|| meta_image(doc))?;

    debug!("Image candidate: {}", candidate);
    normalize_image_url(&candidate, base)
}

fn lightbox_image(doc: &Html) -> Option<String> {
    let sel = Selector::parse("img.bbImage").ok()?;
    doc.select(&sel)
        .find_map(|img| first_usable_attr(img, &["data-url", "data-src", "src"]))
}

fn embedded_image(doc: &Html) -> Option<String> {
    let sel = Selector::parse(".message-body img, .bbWrapper img").ok()?;
    doc.select(&sel)
        .filter(|img| !is_decoration(img))
        .find_map(|img| first_usable_attr(img, &["data-src", "src"]))
}

fn meta_image(doc: &Html) -> Option<String> {
    let sel =
        Selector::parse(r#"meta[property="og:image"], meta[name="twitter:image"]"#).ok()?;
    doc.select(&sel)
        .find_map(|meta| first_usable_attr(meta, &["content"]))
}

fn first_usable_attr(el: ElementRef<'_>, attrs: &[&str]) -> Option<String> {
    attrs
        .iter()
        .filter_map(|attr| el.value().attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty() && !v.starts_with("data:"))
        .map(str::to_string)
}

/// Smilies, avatars and reaction icons are never cover art.
fn is_decoration(img: &ElementRef<'_>) -> bool {
    img.value().classes().any(|c| {
        let c = c.to_lowercase();
        c.contains("smilie") || c.contains("avatar") || c.contains("reaction")
    })
}

/// Make an image URL absolute and point it at the full-resolution asset.
///
/// The `preview.` subdomain is rewritten to `attachments.`, every
/// `/thumb/` path segment is dropped and the query and fragment are cut.
pub fn normalize_image_url(raw: &str, base: Option<&Url>) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with("data:") {
        return None;
    }

    let mut url = match base {
        Some(base) => base.join(raw).ok()?,
        None => Url::parse(raw).ok()?,
    };
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    if let Some(rest) = url.host_str().and_then(|h| h.strip_prefix(PREVIEW_PREFIX)) {
        let host = format!("{}{}", ATTACHMENT_PREFIX, rest);
        url.set_host(Some(&host)).ok()?;
    }

    let mut path = url.path().to_string();
    while path.contains("/thumb/") {
        path = path.replace("/thumb/", "/");
    }
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);

    Some(url.to_string())
}
