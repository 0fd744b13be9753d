//! Application bootstrap.

use std::cell::{Cell, RefCell};

use async_trait::async_trait;
use serde::Serialize;
use tiddeli_core::{AppConfig, Clock, KeyValueStore};
use tiddeli_install::{InstallController, InstallPrompt, InstallUi};
use tiddeli_observability::StructuredLogger;
use tiddeli_router::{History, RouteView, Router};

use crate::error::RegistrationError;

/// Page chrome the bootstrap touches directly.
///
/// Missing elements are no-ops.
pub trait Shell {
    /// Write the running version into `#app-version`.
    fn set_version(&self, version: &str);

    /// Slide the drawer in and show its backdrop.
    fn open_drawer(&self);

    /// Slide the drawer out and hide its backdrop.
    fn close_drawer(&self);

    /// Reload the page.
    fn reload(&self);
}

/// Service worker registration (`navigator.serviceWorker`).
#[async_trait(?Send)]
pub trait WorkerRegistry {
    /// Whether service workers are available at all.
    fn is_supported(&self) -> bool;

    /// Register the worker script.
    async fn register(&self, script_url: &str) -> Result<(), RegistrationError>;
}

/// Whether the page ended up with a service worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OfflineSupport {
    /// The worker registered; assets will be cached.
    Available,
    /// Registration failed or is unsupported; the app runs online only.
    Unavailable,
}

/// Allows a single reload per page when a new worker takes control.
#[derive(Debug, Default)]
pub struct ReloadGuard {
    reloaded: Cell<bool>,
}

impl ReloadGuard {
    /// Create an unused guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true the first time only.
    pub fn should_reload(&self) -> bool {
        !self.reloaded.replace(true)
    }
}

/// The running application.
///
/// Created once at startup; owns the page-level state that is not owned by
/// the router or the install controller.
pub struct App<R, S> {
    config: AppConfig,
    registry: R,
    shell: S,
    reload_guard: ReloadGuard,
    offline: Cell<Option<OfflineSupport>>,
    drawer_open: Cell<bool>,
    registered_url: RefCell<Option<String>>,
    logger: StructuredLogger,
}

impl<R: WorkerRegistry, S: Shell> App<R, S> {
    /// Create the application.
    pub fn new(config: AppConfig, registry: R, shell: S) -> Self {
        Self {
            logger: StructuredLogger::new("app").with_version(config.version.clone()),
            config,
            registry,
            shell,
            reload_guard: ReloadGuard::new(),
            offline: Cell::new(None),
            drawer_open: Cell::new(false),
            registered_url: RefCell::new(None),
        }
    }

    /// Use a specific logger.
    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger.child("app").with_version(self.config.version.clone());
        self
    }

    /// Configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Logger shared with the adapters.
    pub fn logger(&self) -> &StructuredLogger {
        &self.logger
    }

    /// Offline support, once registration has finished.
    pub fn offline_support(&self) -> Option<OfflineSupport> {
        self.offline.get()
    }

    /// Worker URL that was successfully registered.
    pub fn registered_url(&self) -> Option<String> {
        self.registered_url.borrow().clone()
    }

    /// Whether the drawer is open.
    pub fn is_drawer_open(&self) -> bool {
        self.drawer_open.get()
    }

    /// Show the version, set up the install flow and render the first route.
    pub fn start<H, V, P, U, K, C>(
        &self,
        router: &Router<H, V>,
        install: &InstallController<P, U, K, C>,
    ) where
        H: History,
        V: RouteView,
        P: InstallPrompt,
        U: InstallUi,
        K: KeyValueStore,
        C: Clock,
    {
        self.logger.info(&format!(
            "{} v{} initialized",
            self.config.name, self.config.version
        ));
        self.shell.set_version(&self.config.version);

        install.setup();
        router.init();
    }

    /// Register the service worker. Failure leaves the app running without
    /// offline support.
    pub async fn register_worker(&self) -> OfflineSupport {
        let support = if !self.registry.is_supported() {
            self.logger
                .warn("Service workers unsupported, running without offline support");
            OfflineSupport::Unavailable
        } else {
            let url = self.config.service_worker_url();
            self.logger
                .info_with("Registering service worker", &[("url", &url)]);

            match self.registry.register(&url).await {
                Ok(()) => {
                    self.logger.info("Service worker registered");
                    *self.registered_url.borrow_mut() = Some(url);
                    OfflineSupport::Available
                }
                Err(err) => {
                    self.logger
                        .error_with("Service worker registration failed", &[("error", &err)]);
                    OfflineSupport::Unavailable
                }
            }
        };

        self.offline.set(Some(support));
        support
    }

    /// A new worker version is installing.
    pub fn on_update_found(&self) {
        self.logger.info("Service worker update found");
    }

    /// A new worker took control. Reloads once to pick up fresh assets.
    pub fn on_controller_change(&self) -> bool {
        if !self.reload_guard.should_reload() {
            return false;
        }
        self.logger.info("New service worker in control, reloading");
        self.shell.reload();
        true
    }

    /// Menu button clicked.
    pub fn open_drawer(&self) {
        self.drawer_open.set(true);
        self.shell.open_drawer();
    }

    /// Drawer backdrop clicked.
    pub fn close_drawer(&self) {
        self.drawer_open.set(false);
        self.shell.close_drawer();
    }
}

/// Shell that records what the bootstrap did (for native builds and tests).
#[derive(Debug, Default)]
pub struct MemoryShell {
    version: RefCell<Option<String>>,
    drawer_open: Cell<bool>,
    reloads: Cell<usize>,
}

impl MemoryShell {
    /// Create an empty shell.
    pub fn new() -> Self {
        Self::default()
    }

    /// Version text, if written.
    pub fn version(&self) -> Option<String> {
        self.version.borrow().clone()
    }

    /// Whether the drawer is shown.
    pub fn drawer_open(&self) -> bool {
        self.drawer_open.get()
    }

    /// Number of reloads requested.
    pub fn reloads(&self) -> usize {
        self.reloads.get()
    }
}

impl Shell for MemoryShell {
    fn set_version(&self, version: &str) {
        *self.version.borrow_mut() = Some(version.to_string());
    }

    fn open_drawer(&self) {
        self.drawer_open.set(true);
    }

    fn close_drawer(&self) {
        self.drawer_open.set(false);
    }

    fn reload(&self) {
        self.reloads.set(self.reloads.get() + 1);
    }
}

impl<T: Shell + ?Sized> Shell for std::rc::Rc<T> {
    fn set_version(&self, version: &str) {
        (**self).set_version(version)
    }

    fn open_drawer(&self) {
        (**self).open_drawer()
    }

    fn close_drawer(&self) {
        (**self).close_drawer()
    }

    fn reload(&self) {
        (**self).reload()
    }
}

/// Registry with a scripted answer (for native builds and tests).
#[derive(Debug, Default)]
pub struct MemoryWorkerRegistry {
    unsupported: bool,
    rejection: Option<String>,
    registered: RefCell<Vec<String>>,
}

impl MemoryWorkerRegistry {
    /// Registry that accepts every registration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of a browser without service workers.
    pub fn unsupported() -> Self {
        Self {
            unsupported: true,
            ..Self::default()
        }
    }

    /// Registry that rejects every registration.
    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self {
            rejection: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Script URLs registered so far.
    pub fn registered(&self) -> Vec<String> {
        self.registered.borrow().clone()
    }
}

#[async_trait(?Send)]
impl WorkerRegistry for MemoryWorkerRegistry {
    fn is_supported(&self) -> bool {
        !self.unsupported
    }

    async fn register(&self, script_url: &str) -> Result<(), RegistrationError> {
        if self.unsupported {
            return Err(RegistrationError::Unsupported);
        }
        if let Some(reason) = &self.rejection {
            return Err(RegistrationError::Rejected(reason.clone()));
        }
        self.registered.borrow_mut().push(script_url.to_string());
        Ok(())
    }
}

#[async_trait(?Send)]
impl<T: WorkerRegistry + ?Sized> WorkerRegistry for std::rc::Rc<T> {
    fn is_supported(&self) -> bool {
        (**self).is_supported()
    }

    async fn register(&self, script_url: &str) -> Result<(), RegistrationError> {
        (**self).register(script_url).await
    }
}
