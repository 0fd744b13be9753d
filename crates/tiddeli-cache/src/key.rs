//! Cache key composition.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::request::FetchRequest;

/// Key of an entry inside a cache store.
///
/// Mirrors Cache Storage matching: the full request URL including the query
/// string, without the fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a URL.
    pub fn for_url(url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self(url.into())
    }

    /// Key for a request.
    pub fn for_request(request: &FetchRequest) -> Self {
        Self::for_url(&request.url)
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_drops_fragment() {
        let a = CacheKey::for_url(&Url::parse("https://app.example/index.html#top").unwrap());
        let b = CacheKey::for_url(&Url::parse("https://app.example/index.html").unwrap());
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "https://app.example/index.html");
    }

    #[test]
    fn test_key_keeps_query() {
        let a = CacheKey::for_url(&Url::parse("https://app.example/data.json?page=1").unwrap());
        let b = CacheKey::for_url(&Url::parse("https://app.example/data.json?page=2").unwrap());
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_for_request() {
        let url = Url::parse("https://app.example/js/app.js").unwrap();
        let key = CacheKey::for_request(&FetchRequest::get(url.clone()));
        assert_eq!(key, CacheKey::for_url(&url));
        assert_eq!(key.to_string(), "https://app.example/js/app.js");
    }
}
