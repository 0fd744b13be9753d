//! Request classification and fetch strategies.

use http::Method;
use serde::{Deserialize, Serialize};

use crate::request::{Destination, FetchRequest, RequestMode};

/// Path suffix of the dynamic configuration asset.
pub const CONFIG_ASSET_SUFFIX: &str = "/js/config.js";

/// How a request is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchStrategy {
    /// Try the network; fall back to the cache store on failure.
    NetworkFirst,
    /// Serve from the cache store; go to the network on a miss.
    CacheFirst,
}

impl std::fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkFirst => write!(f, "network-first"),
            Self::CacheFirst => write!(f, "cache-first"),
        }
    }
}

/// What kind of GET request the worker is looking at.
///
/// The rules are checked in declaration order; the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestClass {
    /// `mode == navigate` or `destination == document`.
    Navigation,
    /// `Accept` mentions `text/html`.
    Html,
    /// The configuration script, which carries the deployed version.
    Config,
    /// Anything else.
    Static,
}

impl RequestClass {
    /// Strategy applied to this class.
    pub fn strategy(&self) -> FetchStrategy {
        match self {
            Self::Navigation | Self::Html | Self::Config => FetchStrategy::NetworkFirst,
            Self::Static => FetchStrategy::CacheFirst,
        }
    }
}

/// Decides whether and how the worker answers a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptPolicy {
    config_suffix: String,
}

impl Default for InterceptPolicy {
    fn default() -> Self {
        Self {
            config_suffix: CONFIG_ASSET_SUFFIX.to_string(),
        }
    }
}

impl InterceptPolicy {
    /// Create the default policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different path suffix for the configuration asset.
    pub fn with_config_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config_suffix = suffix.into();
        self
    }

    /// Classify a request. `None` means it is not intercepted (non-GET).
    pub fn classify(&self, request: &FetchRequest) -> Option<RequestClass> {
        if request.method != Method::GET {
            return None;
        }

        let class = if request.mode == RequestMode::Navigate
            || request.destination == Destination::Document
        {
            RequestClass::Navigation
        } else if request.accepts_html() {
            RequestClass::Html
        } else if request.url.path().ends_with(&self.config_suffix) {
            RequestClass::Config
        } else {
            RequestClass::Static
        };

        Some(class)
    }

    /// Strategy for a request. `None` means pass through.
    pub fn strategy_for(&self, request: &FetchRequest) -> Option<FetchStrategy> {
        self.classify(request).map(|class| class.strategy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::ACCEPT;
    use http::HeaderValue;
    use url::Url;

    fn get(path: &str) -> FetchRequest {
        FetchRequest::get(Url::parse("https://app.example").unwrap().join(path).unwrap())
    }

    #[test]
    fn test_non_get_passes_through() {
        let policy = InterceptPolicy::new();
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::HEAD] {
            let req = get("/api").with_method(method);
            assert_eq!(policy.classify(&req), None);
            assert_eq!(policy.strategy_for(&req), None);
        }
    }

    #[test]
    fn test_navigation_is_network_first() {
        let policy = InterceptPolicy::new();
        let req = get("/section1").with_mode(RequestMode::Navigate);

        assert_eq!(policy.classify(&req), Some(RequestClass::Navigation));
        assert_eq!(policy.strategy_for(&req), Some(FetchStrategy::NetworkFirst));
    }

    #[test]
    fn test_document_destination_is_navigation() {
        let policy = InterceptPolicy::new();
        let req = get("/frame.html").with_destination(Destination::Document);

        assert_eq!(policy.classify(&req), Some(RequestClass::Navigation));
    }

    #[test]
    fn test_html_accept_is_network_first() {
        let policy = InterceptPolicy::new();
        let req = get("/partial").with_header(ACCEPT, HeaderValue::from_static("text/html"));

        assert_eq!(policy.classify(&req), Some(RequestClass::Html));
        assert_eq!(policy.strategy_for(&req), Some(FetchStrategy::NetworkFirst));
    }

    #[test]
    fn test_config_is_network_first() {
        let policy = InterceptPolicy::new();

        assert_eq!(policy.classify(&get("/js/config.js")), Some(RequestClass::Config));
        assert_eq!(
            policy.classify(&get("/TiddeliPWATemplate/js/config.js?x=1")),
            Some(RequestClass::Config)
        );
    }

    #[test]
    fn test_static_assets_are_cache_first() {
        let policy = InterceptPolicy::new();

        for path in ["/js/app.js", "/data/items.json", "/css/tailwind.output.css", "/js/config.json"] {
            assert_eq!(policy.classify(&get(path)), Some(RequestClass::Static), "{}", path);
            assert_eq!(policy.strategy_for(&get(path)), Some(FetchStrategy::CacheFirst));
        }
    }

    #[test]
    fn test_html_extension_alone_is_not_html() {
        // Classification follows request metadata, not file extensions.
        let policy = InterceptPolicy::new();
        assert_eq!(policy.classify(&get("/index.html")), Some(RequestClass::Static));
    }

    #[test]
    fn test_custom_config_suffix() {
        let policy = InterceptPolicy::new().with_config_suffix("/settings.js");

        assert_eq!(policy.classify(&get("/settings.js")), Some(RequestClass::Config));
        assert_eq!(policy.classify(&get("/js/config.js")), Some(RequestClass::Static));
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(FetchStrategy::NetworkFirst.to_string(), "network-first");
        assert_eq!(FetchStrategy::CacheFirst.to_string(), "cache-first");
    }
}
