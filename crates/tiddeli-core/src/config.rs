//! Application configuration.
//!
//! The running version is the only value shared between the document and the
//! service worker, and it travels through the worker script URL.

use serde::{Deserialize, Serialize};
use url::Url;

/// Application version. Bump this when releasing.
pub const APP_VERSION: &str = "1.0.356";

/// Application name, used in document titles and logs.
pub const APP_NAME: &str = "Tiddeli PWA Template";

/// Prefix of every cache store name.
pub const CACHE_PREFIX: &str = "tiddeli-pwa";

/// Absolute path of the service worker script.
pub const WORKER_SCRIPT_PATH: &str = "/sw.js";

/// Query parameter carrying the version on the worker script URL.
pub const VERSION_QUERY_PARAM: &str = "v";

/// Version assumed by a worker whose script URL carries none.
pub const DEFAULT_WORKER_VERSION: &str = "0.0.0";

/// Compiled-in application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name.
    pub name: String,
    /// Running version.
    pub version: String,
    /// Cache store name prefix.
    pub cache_prefix: String,
    /// Worker script path.
    pub worker_script: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: APP_NAME.to_string(),
            version: APP_VERSION.to_string(),
            cache_prefix: CACHE_PREFIX.to_string(),
            worker_script: WORKER_SCRIPT_PATH.to_string(),
        }
    }
}

impl AppConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the running version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Override the application name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Override the cache store prefix.
    pub fn with_cache_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cache_prefix = prefix.into();
        self
    }

    /// Name of the cache store owned by the running version.
    pub fn cache_name(&self) -> String {
        cache_name(&self.cache_prefix, &self.version)
    }

    /// Worker script URL carrying the running version, e.g. `/sw.js?v=1.0.356`.
    pub fn service_worker_url(&self) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(self.version.as_bytes()).collect();
        format!("{}?{}={}", self.worker_script, VERSION_QUERY_PARAM, encoded)
    }

    /// Document title for a page.
    pub fn page_title(&self, title: &str) -> String {
        format!("{} - {}", title, self.name)
    }
}

/// Build a cache store name: `"<prefix>-v<version>"`.
pub fn cache_name(prefix: &str, version: &str) -> String {
    format!("{}-v{}", prefix, version)
}

/// Read the version a worker was registered with from its script URL.
///
/// Relative URLs are accepted. Falls back to [`DEFAULT_WORKER_VERSION`] when
/// the URL cannot be parsed or carries no (or an empty) version.
pub fn version_from_script_url(script_url: &str) -> String {
    let parsed = Url::parse(script_url).or_else(|_| {
        Url::parse("http://localhost/").and_then(|base| base.join(script_url))
    });

    parsed
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == VERSION_QUERY_PARAM)
                .map(|(_, value)| value.into_owned())
        })
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_WORKER_VERSION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();

        assert_eq!(config.name, "Tiddeli PWA Template");
        assert_eq!(config.version, "1.0.356");
        assert_eq!(config.worker_script, "/sw.js");
    }

    #[test]
    fn test_cache_name_embeds_version() {
        assert_eq!(cache_name("tiddeli-pwa", "1.0.355"), "tiddeli-pwa-v1.0.355");
        assert_eq!(AppConfig::new().cache_name(), "tiddeli-pwa-v1.0.356");
    }

    #[test]
    fn test_service_worker_url() {
        let config = AppConfig::new().with_version("1.0.356");
        assert_eq!(config.service_worker_url(), "/sw.js?v=1.0.356");
    }

    #[test]
    fn test_service_worker_url_encodes_version() {
        let config = AppConfig::new().with_version("2.0 beta&x");
        assert_eq!(config.service_worker_url(), "/sw.js?v=2.0+beta%26x");
    }

    #[test]
    fn test_version_round_trips_through_script_url() {
        let config = AppConfig::new().with_version("2.0 beta&x");
        assert_eq!(version_from_script_url(&config.service_worker_url()), "2.0 beta&x");
    }

    #[test]
    fn test_version_from_absolute_url() {
        let version = version_from_script_url("https://example.com/sw.js?v=1.0.355");
        assert_eq!(version, "1.0.355");
    }

    #[test]
    fn test_version_defaults_when_missing() {
        assert_eq!(version_from_script_url("/sw.js"), DEFAULT_WORKER_VERSION);
        assert_eq!(version_from_script_url("/sw.js?v="), DEFAULT_WORKER_VERSION);
        assert_eq!(version_from_script_url("/sw.js?other=1"), DEFAULT_WORKER_VERSION);
    }

    #[test]
    fn test_page_title() {
        let config = AppConfig::new();
        assert_eq!(config.page_title("Home"), "Home - Tiddeli PWA Template");
    }

    #[test]
    fn test_builder_chain() {
        let config = AppConfig::new()
            .with_name("Demo")
            .with_version("9.9.9")
            .with_cache_prefix("demo");

        assert_eq!(config.cache_name(), "demo-v9.9.9");
        assert_eq!(config.page_title("Settings"), "Settings - Demo");
    }
}
