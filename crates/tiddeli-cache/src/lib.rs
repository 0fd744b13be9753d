//! Versioned offline cache and service worker lifecycle for the Tiddeli PWA.
//!
//! This crate provides:
//! - `ServiceWorker` - Install / activate / fetch lifecycle over a versioned cache store
//! - `InterceptPolicy` - Network-first vs cache-first request classification
//! - `CacheStorage` / `CacheStore` - Cache Storage API seam (`MemoryCacheStorage` for tests)
//! - `Network` - Fetch seam (`MemoryNetwork` for tests)
//! - `PRECACHE_MANIFEST` - Assets stored at install time
//!
//! # Example
//!
//! ```ignore
//! use tiddeli_cache::{ServiceWorker, FetchOutcome};
//!
//! let worker = ServiceWorker::new(&script_url, caches, network, scope);
//! worker.install().await;
//! worker.activate().await;
//!
//! match worker.handle_fetch(&request).await? {
//!     FetchOutcome::Responded(response) => { /* respondWith(response) */ }
//!     FetchOutcome::Passthrough => { /* let the browser handle it */ }
//! }
//! ```

mod error;
mod key;
mod manifest;
mod network;
mod policy;
mod request;
mod storage;
mod worker;

pub use error::*;
pub use key::*;
pub use manifest::*;
pub use network::*;
pub use policy::*;
pub use request::*;
pub use storage::*;
pub use worker::*;
