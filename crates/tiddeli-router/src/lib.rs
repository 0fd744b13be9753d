//! Client-side routing for the Tiddeli PWA.
//!
//! This crate provides:
//! - `RouteRegistry` - The static route table, with `/` as the fallback
//! - `Router` - Path normalization, history updates and page rendering
//! - `History` / `RouteView` - Browser seams (`MemoryHistory` / `MemoryView` for tests)
//! - `component_content` - HTML templates for each page
//!
//! # Usage
//!
//! ```rust,ignore
//! use tiddeli_router::prelude::*;
//!
//! let router = Router::new(history, view);
//! router.init();
//!
//! // On popstate
//! router.handle_pop_state();
//!
//! // On a navigation item click
//! router.navigate("/section1");
//! ```

mod content;
pub mod prelude;
mod route;
mod router;

pub use content::*;
pub use route::*;
pub use router::*;
