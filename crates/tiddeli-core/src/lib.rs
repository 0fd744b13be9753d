//! Configuration and platform seams for the Tiddeli PWA.
//!
//! This crate provides:
//! - `AppConfig` - Version/name constants and service worker URL helpers
//! - `KeyValueStore` - Durable local key/value storage (`localStorage`)
//! - `Clock` - Wall clock used by time-based policies

mod clock;
mod config;
mod storage;

pub use clock::*;
pub use config::*;
pub use storage::*;
