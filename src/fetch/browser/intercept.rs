//! Network request filtering for rendered fetches.

use url::Url;

#[cfg(feature = "browser")]
use chromiumoxide::cdp::browser_protocol::network::ResourceType;

/// Coarse resource category of an outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Document,
    Script,
    Stylesheet,
    Xhr,
    Image,
    Font,
    Media,
    Other,
}

#[cfg(feature = "browser")]
impl From<&ResourceType> for ResourceKind {
    fn from(kind: &ResourceType) -> Self {
        match kind {
            ResourceType::Document => Self::Document,
            ResourceType::Script => Self::Script,
            ResourceType::Stylesheet => Self::Stylesheet,
            ResourceType::Xhr | ResourceType::Fetch => Self::Xhr,
            ResourceType::Image => Self::Image,
            ResourceType::Font => Self::Font,
            ResourceType::Media => Self::Media,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Allow,
    Block,
}

/// Decides which requests a rendered page may make.
///
/// Fonts and media never load. Images load only from the configured image
/// hosts (or their subdomains). Everything else passes, since the tag list
/// depends on scripts and XHR.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    image_hosts: Vec<String>,
}

impl RequestFilter {
    pub fn new(image_hosts: &[String]) -> Self {
        Self {
            image_hosts: image_hosts
                .iter()
                .map(|h| h.trim().trim_start_matches('.').to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    pub fn decide(&self, kind: ResourceKind, url: &str) -> FilterDecision {
        match kind {
            ResourceKind::Font | ResourceKind::Media => FilterDecision::Block,
            ResourceKind::Image if self.is_allowed_image_host(url) => FilterDecision::Allow,
            ResourceKind::Image => FilterDecision::Block,
            _ => FilterDecision::Allow,
        }
    }

    fn is_allowed_image_host(&self, url: &str) -> bool {
        let Some(host) = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase))
        else {
            return false;
        };

        self.image_hosts
            .iter()
            .any(|allowed| host == *allowed || host.ends_with(&format!(".{}", allowed)))
    }
}
