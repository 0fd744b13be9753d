//! Prelude for convenient imports.
//!
//! ```rust,ignore
//! use tiddeli_router::prelude::*;
//! ```

pub use crate::{History, Navigation, RouteEntry, RouteRegistry, RouteView, Router};
