//! Install prompt and install banner flow for the Tiddeli PWA.
//!
//! This crate provides:
//! - `InstallController` - Holds the deferred prompt and drives the install UI
//! - `BannerPolicy` - Snooze and version-seen rules for the install banner
//! - `InstallPrompt` / `InstallUi` - Browser seams (`ScriptedPrompt` / `MemoryInstallUi` for tests)

mod controller;
mod error;
mod policy;
mod ui;

pub use controller::*;
pub use error::*;
pub use policy::*;
pub use ui::*;
