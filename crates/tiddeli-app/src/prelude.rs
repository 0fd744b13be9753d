//! Prelude for convenient imports.
//!
//! ```rust,ignore
//! use tiddeli_app::prelude::*;
//! ```

// Configuration
pub use tiddeli_core::{AppConfig, Clock, KeyValueStore, SystemClock, APP_NAME, APP_VERSION};

// Logging
pub use tiddeli_observability::{LogLevel, StructuredLogger};

// Router
pub use tiddeli_router::prelude::*;

// Install flow
pub use tiddeli_install::{BannerPolicy, InstallController, InstallSource, InstallState};

// Application shell
pub use crate::{App, OfflineSupport, RegistrationError, ReloadGuard, Shell, WorkerRegistry};
