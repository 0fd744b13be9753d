//! Cache and worker error types.

use thiserror::Error;

/// Result type for cache storage operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache Storage operation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Failed to open (or create) a cache store.
    #[error("failed to open cache {name}: {reason}")]
    Open { name: String, reason: String },

    /// Failed to read from a cache store.
    #[error("cache read failed: {0}")]
    Read(String),

    /// Failed to write to a cache store (e.g. quota exceeded).
    #[error("cache write failed: {0}")]
    Write(String),

    /// Failed to delete a cache store.
    #[error("failed to delete cache {name}: {reason}")]
    Delete { name: String, reason: String },
}

/// A network fetch that did not produce a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// The device is offline or the host is unreachable.
    #[error("network unreachable: {0}")]
    Unreachable(String),

    /// The fetch was rejected by the platform (CORS, bad request, ...).
    #[error("fetch rejected: {0}")]
    Rejected(String),
}

/// Why a manifest asset could not be pre-cached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// The asset path does not resolve against the worker scope.
    #[error("invalid asset url: {0}")]
    InvalidUrl(String),

    /// The fetch failed.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The server answered with a non-OK status.
    #[error("bad status {0}")]
    Status(u16),

    /// Writing the response into the store failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// A failed request surfaced to the page.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    /// Network-first request: the network failed and nothing was cached.
    #[error("offline and no cached copy of {url}")]
    Offline {
        url: String,
        #[source]
        source: NetworkError,
    },

    /// Cache-first request: not cached and the network failed.
    #[error("fetch of {url} failed")]
    Network {
        url: String,
        #[source]
        source: NetworkError,
    },

    /// A lifecycle hook (skip waiting, claim) failed.
    #[error("lifecycle hook failed: {0}")]
    Lifecycle(String),
}
