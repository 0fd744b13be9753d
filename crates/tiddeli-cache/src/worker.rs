//! Service worker lifecycle over a versioned cache store.

use std::cell::Cell;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tiddeli_core::{cache_name, version_from_script_url, CACHE_PREFIX};
use tiddeli_observability::StructuredLogger;
use url::Url;

use crate::error::{AssetError, WorkerError};
use crate::key::CacheKey;
use crate::manifest::PRECACHE_MANIFEST;
use crate::network::Network;
use crate::policy::{FetchStrategy, InterceptPolicy};
use crate::request::{FetchRequest, Response};
use crate::storage::{CacheStorage, CacheStore};

/// Lifecycle state of a worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Script loaded, install not started.
    Uninstalled,
    /// Pre-caching the manifest.
    Installing,
    /// Installed, about to take over.
    Waiting,
    /// Serving fetches for all clients.
    Active,
    /// Superseded by a newer worker.
    Redundant,
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninstalled => write!(f, "uninstalled"),
            Self::Installing => write!(f, "installing"),
            Self::Waiting => write!(f, "waiting"),
            Self::Active => write!(f, "active"),
            Self::Redundant => write!(f, "redundant"),
        }
    }
}

/// Platform hooks of the worker global scope.
#[async_trait(?Send)]
pub trait WorkerScope {
    /// `self.skipWaiting()`: activate without waiting for old clients to close.
    async fn skip_waiting(&self) -> Result<(), WorkerError>;

    /// `clients.claim()`: take control of already-open pages.
    async fn claim_clients(&self) -> Result<(), WorkerError>;
}

#[async_trait(?Send)]
impl<T: WorkerScope + ?Sized> WorkerScope for std::rc::Rc<T> {
    async fn skip_waiting(&self) -> Result<(), WorkerError> {
        (**self).skip_waiting().await
    }

    async fn claim_clients(&self) -> Result<(), WorkerError> {
        (**self).claim_clients().await
    }
}

/// Worker scope that records hook calls (for native builds and tests).
#[derive(Debug, Default)]
pub struct MemoryWorkerScope {
    skip_waiting_calls: Cell<usize>,
    claim_calls: Cell<usize>,
}

impl MemoryWorkerScope {
    /// Create a scope with no recorded calls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Times `skip_waiting` was called.
    pub fn skip_waiting_calls(&self) -> usize {
        self.skip_waiting_calls.get()
    }

    /// Times `claim_clients` was called.
    pub fn claim_calls(&self) -> usize {
        self.claim_calls.get()
    }
}

#[async_trait(?Send)]
impl WorkerScope for MemoryWorkerScope {
    async fn skip_waiting(&self) -> Result<(), WorkerError> {
        self.skip_waiting_calls.set(self.skip_waiting_calls.get() + 1);
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), WorkerError> {
        self.claim_calls.set(self.claim_calls.get() + 1);
        Ok(())
    }
}

/// An asset that could not be pre-cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAsset {
    /// Manifest path.
    pub asset: String,
    /// Why it failed.
    pub error: AssetError,
}

/// Outcome of the install step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Store that was populated.
    pub cache_name: String,
    /// Manifest paths that were stored.
    pub cached: Vec<String>,
    /// Manifest paths that failed.
    pub failed: Vec<FailedAsset>,
    /// Whether the store could be opened at all.
    pub store_opened: bool,
}

impl InstallReport {
    /// Whether every manifest asset was stored.
    pub fn is_complete(&self) -> bool {
        self.store_opened && self.failed.is_empty()
    }
}

/// Outcome of the activate step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Stale stores that were deleted.
    pub deleted: Vec<String>,
    /// Stale stores whose deletion failed.
    pub failed: Vec<String>,
    /// Whether open pages were claimed.
    pub claimed: bool,
}

/// What the fetch handler did with a request.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Not intercepted; the browser performs the request itself.
    Passthrough,
    /// Answered by the worker.
    Responded(Response),
}

/// A service worker instance bound to one version.
///
/// The cache store name is fixed at construction from the script URL's
/// version parameter, so every request this instance serves reads and writes
/// the store of the version it was registered with.
pub struct ServiceWorker<S, N, W> {
    version: String,
    cache_name: String,
    scope: Url,
    manifest: Vec<String>,
    policy: InterceptPolicy,
    storage: S,
    network: N,
    hooks: W,
    state: Cell<WorkerState>,
    logger: StructuredLogger,
}

impl<S, N, W> ServiceWorker<S, N, W>
where
    S: CacheStorage,
    N: Network,
    W: WorkerScope,
{
    /// Create a worker from its script URL (e.g. `https://host/sw.js?v=1.0.356`).
    ///
    /// The scope is the script's directory.
    pub fn new(script_url: &Url, storage: S, network: N, hooks: W) -> Self {
        let version = version_from_script_url(script_url.as_str());
        let scope = script_url.join("./").unwrap_or_else(|_| script_url.clone());

        Self {
            cache_name: cache_name(CACHE_PREFIX, &version),
            logger: StructuredLogger::new("service-worker").with_version(version.clone()),
            version,
            scope,
            manifest: PRECACHE_MANIFEST.iter().map(|s| s.to_string()).collect(),
            policy: InterceptPolicy::default(),
            storage,
            network,
            hooks,
            state: Cell::new(WorkerState::Uninstalled),
        }
    }

    /// Replace the pre-cache manifest.
    pub fn with_manifest(mut self, assets: &[&str]) -> Self {
        self.manifest = assets.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Replace the cache store prefix.
    pub fn with_cache_prefix(mut self, prefix: &str) -> Self {
        self.cache_name = cache_name(prefix, &self.version);
        self
    }

    /// Use a specific logger (the component name is kept).
    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger.child("service-worker").with_version(self.version.clone());
        self
    }

    /// Version this worker was registered with.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Name of the store this worker owns.
    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    /// Scope URL assets are resolved against.
    pub fn scope(&self) -> &Url {
        &self.scope
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        self.state.get()
    }

    fn transition(&self, next: WorkerState) {
        let previous = self.state.replace(next);
        if previous != next {
            self.logger
                .debug_builder("State changed")
                .field("from", previous.to_string())
                .field("to", next.to_string())
                .emit();
        }
    }

    /// Mark this worker as superseded by a newer one.
    ///
    /// Called by the browser adapter when a worker with a different script
    /// URL activates on the same registration.
    pub fn supersede(&self) {
        if self.state() != WorkerState::Redundant {
            self.logger.info("Superseded by a newer worker");
        }
        self.transition(WorkerState::Redundant);
    }

    // === Install ===

    /// Pre-cache the manifest into this version's store.
    ///
    /// Each asset is fetched and stored independently; failures are logged
    /// and reported but never stop the other assets. The returned future
    /// settles only once every asset has settled, so it can be handed to
    /// `waitUntil` as-is.
    pub async fn install(&self) -> InstallReport {
        self.transition(WorkerState::Installing);
        self.logger.info_with("Installing", &[("cache", &self.cache_name)]);

        let report = match self.storage.open(&self.cache_name).await {
            Ok(store) => self.precache(&store).await,
            Err(err) => {
                self.logger
                    .error_with("Installation failed", &[("error", &err)]);
                InstallReport {
                    cache_name: self.cache_name.clone(),
                    cached: Vec::new(),
                    failed: Vec::new(),
                    store_opened: false,
                }
            }
        };

        if let Err(err) = self.hooks.skip_waiting().await {
            self.logger.warn_with("skipWaiting failed", &[("error", &err)]);
        }

        self.transition(WorkerState::Waiting);
        report
    }

    async fn precache(&self, store: &S::Store) -> InstallReport {
        let results = join_all(
            self.manifest
                .iter()
                .map(|asset| async move { (asset, self.cache_asset(store, asset).await) }),
        )
        .await;

        let mut cached = Vec::new();
        let mut failed = Vec::new();
        for (asset, result) in results {
            match result {
                Ok(()) => cached.push(asset.clone()),
                Err(error) => {
                    self.logger.error_with(
                        "Failed to cache asset",
                        &[("asset", asset), ("error", &error)],
                    );
                    failed.push(FailedAsset {
                        asset: asset.clone(),
                        error,
                    });
                }
            }
        }

        self.logger
            .info_builder("Caching completed")
            .field_i64("cached", cached.len() as i64)
            .field_i64("failed", failed.len() as i64)
            .emit();

        InstallReport {
            cache_name: self.cache_name.clone(),
            cached,
            failed,
            store_opened: true,
        }
    }

    async fn cache_asset(&self, store: &S::Store, asset: &str) -> Result<(), AssetError> {
        let url = self
            .scope
            .join(asset)
            .map_err(|e| AssetError::InvalidUrl(format!("{}: {}", asset, e)))?;
        let request = FetchRequest::get(url);

        let response = self.network.fetch(&request).await?;
        if !response.status.is_success() {
            return Err(AssetError::Status(response.status.as_u16()));
        }

        store.put(&CacheKey::for_request(&request), response).await?;
        Ok(())
    }

    // === Activate ===

    /// Delete every store but this version's, then claim open pages.
    pub async fn activate(&self) -> ActivationReport {
        self.logger.info("Activating");

        let names = match self.storage.names().await {
            Ok(names) => names,
            Err(err) => {
                self.logger
                    .error_with("Failed to list caches", &[("error", &err)]);
                Vec::new()
            }
        };

        let stale: Vec<String> = names
            .into_iter()
            .filter(|name| *name != self.cache_name)
            .collect();

        let results = join_all(stale.iter().map(|name| async move {
            self.logger.info_with("Removing old cache", &[("cache", name)]);
            (name, self.storage.delete(name).await)
        }))
        .await;

        let mut report = ActivationReport::default();
        for (name, result) in results {
            match result {
                Ok(_) => report.deleted.push(name.clone()),
                Err(err) => {
                    self.logger.error_with(
                        "Failed to remove old cache",
                        &[("cache", name), ("error", &err)],
                    );
                    report.failed.push(name.clone());
                }
            }
        }

        match self.hooks.claim_clients().await {
            Ok(()) => report.claimed = true,
            Err(err) => self.logger.warn_with("clients.claim failed", &[("error", &err)]),
        }

        self.transition(WorkerState::Active);
        report
    }

    // === Fetch ===

    /// Strategy for a request, `None` if it is not intercepted.
    pub fn strategy_for(&self, request: &FetchRequest) -> Option<FetchStrategy> {
        self.policy.strategy_for(request)
    }

    /// Handle an intercepted request end to end.
    pub async fn handle_fetch(&self, request: &FetchRequest) -> Result<FetchOutcome, WorkerError> {
        match self.strategy_for(request) {
            None => Ok(FetchOutcome::Passthrough),
            Some(strategy) => self
                .respond(request, strategy)
                .await
                .map(FetchOutcome::Responded),
        }
    }

    /// Answer a request with the given strategy.
    pub async fn respond(
        &self,
        request: &FetchRequest,
        strategy: FetchStrategy,
    ) -> Result<Response, WorkerError> {
        self.respond_using(request, strategy, &self.network).await
    }

    /// Answer a request with the given strategy, going to the network through
    /// `network` instead of the worker's own.
    ///
    /// The browser adapter passes a network bound to the intercepted request
    /// so its headers, mode and credentials reach the server unchanged;
    /// `request` is then only used to key the cache.
    pub async fn respond_using<M: Network>(
        &self,
        request: &FetchRequest,
        strategy: FetchStrategy,
        network: &M,
    ) -> Result<Response, WorkerError> {
        match strategy {
            FetchStrategy::NetworkFirst => self.network_first(request, network).await,
            FetchStrategy::CacheFirst => self.cache_first(request, network).await,
        }
    }

    async fn network_first<M: Network>(
        &self,
        request: &FetchRequest,
        network: &M,
    ) -> Result<Response, WorkerError> {
        let key = CacheKey::for_request(request);

        match network.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.store_copy(&key, &response).await;
                }
                Ok(response)
            }
            Err(source) => {
                self.logger
                    .warn_with("Network failed, falling back to cache", &[("url", &key)]);
                match self.lookup(&key).await {
                    Some(cached) => Ok(cached),
                    None => Err(WorkerError::Offline {
                        url: key.to_string(),
                        source,
                    }),
                }
            }
        }
    }

    async fn cache_first<M: Network>(
        &self,
        request: &FetchRequest,
        network: &M,
    ) -> Result<Response, WorkerError> {
        let key = CacheKey::for_request(request);

        if let Some(cached) = self.lookup(&key).await {
            return Ok(cached);
        }

        let response = network
            .fetch(request)
            .await
            .map_err(|source| {
                self.logger.warn_with("Fetch failed", &[("url", &key)]);
                WorkerError::Network {
                    url: key.to_string(),
                    source,
                }
            })?;

        if response.is_cacheable() {
            self.store_copy(&key, &response).await;
        }
        Ok(response)
    }

    async fn lookup(&self, key: &CacheKey) -> Option<Response> {
        let store = match self.storage.open(&self.cache_name).await {
            Ok(store) => store,
            Err(err) => {
                self.logger.warn_with("Cache unavailable", &[("error", &err)]);
                return None;
            }
        };

        match store.lookup(key).await {
            Ok(found) => found,
            Err(err) => {
                self.logger
                    .warn_with("Cache read failed", &[("url", key), ("error", &err)]);
                None
            }
        }
    }

    async fn store_copy(&self, key: &CacheKey, response: &Response) {
        let result = match self.storage.open(&self.cache_name).await {
            Ok(store) => store.put(key, response.clone()).await,
            Err(err) => Err(err),
        };

        if let Err(err) = result {
            self.logger
                .warn_with("Cache write failed", &[("url", key), ("error", &err)]);
        }
    }
}
