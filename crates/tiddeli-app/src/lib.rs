//! Tiddeli PWA application.
//!
//! This crate provides:
//! - `App` - Page bootstrap: version display, install flow, first render, worker registration
//! - `WorkerRegistry` / `Shell` - Seams over `navigator.serviceWorker` and the page chrome
//! - `ReloadGuard` - Single reload when a new worker takes control
//! - Browser entry points (`wasm32` only): `boot_document` for the page, `boot_worker` for `sw.js`
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use tiddeli_app::prelude::*;
//!
//! let app = App::new(AppConfig::new(), registry, shell);
//! app.start(&router, &install);
//! app.register_worker().await;
//! ```

pub mod prelude;
mod app;
mod error;

#[cfg(target_arch = "wasm32")]
mod web;

pub use app::*;
pub use error::*;

#[cfg(target_arch = "wasm32")]
pub use web::*;
