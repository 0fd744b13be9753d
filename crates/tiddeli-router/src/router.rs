//! History-driven navigation.

use std::cell::RefCell;
use std::rc::Rc;

use tiddeli_core::AppConfig;
use tiddeli_observability::StructuredLogger;

use crate::content::component_content;
use crate::route::{first_segment, RouteEntry, RouteRegistry, ROOT_PATH};

/// Browser history and location.
pub trait History {
    /// Current location pathname.
    fn current_path(&self) -> String;

    /// Push a new entry without reloading (`history.pushState`).
    fn push(&self, path: &str);
}

impl<T: History + ?Sized> History for Rc<T> {
    fn current_path(&self) -> String {
        (**self).current_path()
    }

    fn push(&self, path: &str) {
        (**self).push(path)
    }
}

/// The page regions a navigation updates.
///
/// Implementations treat missing elements as no-ops.
pub trait RouteView {
    /// Set the document title.
    fn set_title(&self, title: &str);

    /// Replace the main content container's HTML.
    fn render_main(&self, html: &str);

    /// Mark the navigation item for `active_path` as active and all others inactive.
    fn highlight_nav(&self, active_path: &str);
}

impl<T: RouteView + ?Sized> RouteView for Rc<T> {
    fn set_title(&self, title: &str) {
        (**self).set_title(title)
    }

    fn render_main(&self, html: &str) {
        (**self).render_main(html)
    }

    fn highlight_nav(&self, active_path: &str) {
        (**self).highlight_nav(active_path)
    }
}

/// In-memory history (for native builds and tests).
#[derive(Debug)]
pub struct MemoryHistory {
    entries: RefCell<Vec<String>>,
}

impl MemoryHistory {
    /// Start at a location.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            entries: RefCell::new(vec![path.into()]),
        }
    }

    /// Simulate the back button. Returns false at the first entry.
    pub fn back(&self) -> bool {
        let mut entries = self.entries.borrow_mut();
        if entries.len() > 1 {
            entries.pop();
            true
        } else {
            false
        }
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }
}

impl History for MemoryHistory {
    fn current_path(&self) -> String {
        self.entries.borrow().last().cloned().unwrap_or_default()
    }

    fn push(&self, path: &str) {
        self.entries.borrow_mut().push(path.to_string());
    }
}

/// View that records what was rendered (for native builds and tests).
#[derive(Debug, Default)]
pub struct MemoryView {
    title: RefCell<String>,
    main: RefCell<String>,
    active_nav: RefCell<Option<String>>,
    renders: RefCell<usize>,
}

impl MemoryView {
    /// Create an empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current document title.
    pub fn title(&self) -> String {
        self.title.borrow().clone()
    }

    /// Current main content.
    pub fn main(&self) -> String {
        self.main.borrow().clone()
    }

    /// Currently highlighted navigation path.
    pub fn active_nav(&self) -> Option<String> {
        self.active_nav.borrow().clone()
    }

    /// How many times the main content was rendered.
    pub fn render_count(&self) -> usize {
        *self.renders.borrow()
    }
}

impl RouteView for MemoryView {
    fn set_title(&self, title: &str) {
        *self.title.borrow_mut() = title.to_string();
    }

    fn render_main(&self, html: &str) {
        *self.main.borrow_mut() = html.to_string();
        *self.renders.borrow_mut() += 1;
    }

    fn highlight_nav(&self, active_path: &str) {
        *self.active_nav.borrow_mut() = Some(active_path.to_string());
    }
}

/// Detect the deployment base path from the startup location.
///
/// The first segment is the base path (`/TiddeliPWATemplate`,
/// `/TiddeliPWATemplate/` or `/TiddeliPWATemplate/section1`) unless it is
/// `index.html` or the first segment of a registered route. Root deployments
/// yield an empty base path.
pub fn detect_base_path(path: &str, routes: &RouteRegistry) -> String {
    let segment = first_segment(path);

    if segment.is_empty() || segment == "index.html" || routes.owns_segment(segment) {
        return String::new();
    }

    format!("/{}", segment)
}

/// Result of a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    /// Route that was rendered.
    pub route: RouteEntry,
    /// Location after the navigation, base path included.
    pub full_path: String,
    /// Whether a history entry was pushed.
    pub pushed: bool,
}

/// Client-side router.
///
/// Owns the base path (detected once at construction) and the current route.
pub struct Router<H, V> {
    routes: RouteRegistry,
    base_path: String,
    config: AppConfig,
    current: RefCell<String>,
    history: H,
    view: V,
    logger: StructuredLogger,
}

impl<H: History, V: RouteView> Router<H, V> {
    /// Create a router with the default routes.
    pub fn new(history: H, view: V) -> Self {
        Self::with_routes(RouteRegistry::default(), history, view)
    }

    /// Create a router over a custom route table.
    pub fn with_routes(routes: RouteRegistry, history: H, view: V) -> Self {
        let base_path = detect_base_path(&history.current_path(), &routes);

        Self {
            routes,
            base_path,
            config: AppConfig::new(),
            current: RefCell::new(ROOT_PATH.to_string()),
            history,
            view,
            logger: StructuredLogger::new("router"),
        }
    }

    /// Use the application name from a config for titles.
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.config = config.clone();
        self
    }

    /// Override the detected base path (`""` or `/segment`).
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        let base_path: String = base_path.into();
        self.base_path = base_path.trim_end_matches('/').to_string();
        self
    }

    /// Use a specific logger.
    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger.child("router");
        self
    }

    /// Deployment base path (empty at the origin root).
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Path of the current route.
    pub fn current_route(&self) -> String {
        self.current.borrow().clone()
    }

    /// Route table.
    pub fn routes(&self) -> &RouteRegistry {
        &self.routes
    }

    /// Map a location pathname to a route path.
    ///
    /// `/index.html` and anything ending in `/index.html` become `/`; the base
    /// path prefix is removed. Applying it twice gives the same result.
    pub fn normalize_path(&self, path: &str) -> String {
        if path == "/index.html" || path.ends_with("/index.html") {
            return ROOT_PATH.to_string();
        }

        let mut rest = path;
        if !self.base_path.is_empty() {
            while let Some(stripped) = strip_segment_prefix(rest, &self.base_path) {
                rest = stripped;
            }
        }

        if rest.is_empty() {
            ROOT_PATH.to_string()
        } else {
            rest.to_string()
        }
    }

    /// Location for a route path, base path included.
    pub fn full_path(&self, route_path: &str) -> String {
        if self.base_path.is_empty() {
            route_path.to_string()
        } else if route_path == ROOT_PATH {
            format!("{}/", self.base_path)
        } else {
            format!("{}{}", self.base_path, route_path)
        }
    }

    /// Navigate to a path. Unknown paths render the root route.
    pub fn navigate(&self, path: &str) -> Navigation {
        let normalized = self.normalize_path(path);
        let route = self.routes.resolve(&normalized).clone();
        if route.path != normalized {
            self.logger
                .debug_builder("Unknown route, showing root")
                .field("path", normalized.clone())
                .emit();
        }

        let full_path = self.full_path(&route.path);
        let pushed = self.history.current_path() != full_path;
        if pushed {
            self.history.push(&full_path);
        }

        self.view.set_title(&self.config.page_title(&route.title));
        self.view.render_main(component_content(&route.component));
        self.view.highlight_nav(&route.path);
        *self.current.borrow_mut() = route.path.clone();

        self.logger
            .debug_builder("Navigated")
            .field("route", route.path.clone())
            .field_bool("pushed", pushed)
            .emit();

        Navigation {
            route,
            full_path,
            pushed,
        }
    }

    /// Render the route for the current location.
    pub fn init(&self) -> Navigation {
        self.logger.info_with(
            "Router initialized",
            &[("base_path", &self.base_path), ("routes", &self.routes.len())],
        );
        self.handle_pop_state()
    }

    /// Re-render after back/forward navigation.
    pub fn handle_pop_state(&self) -> Navigation {
        let path = self.history.current_path();
        self.navigate(&path)
    }
}

fn strip_segment_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestRouter = Router<Rc<MemoryHistory>, Rc<MemoryView>>;

    fn router_at(path: &str) -> (TestRouter, Rc<MemoryHistory>, Rc<MemoryView>) {
        let history = Rc::new(MemoryHistory::new(path));
        let view = Rc::new(MemoryView::new());
        let router = Router::new(history.clone(), view.clone());
        (router, history, view)
    }

    // === Base path ===

    #[test]
    fn test_base_path_at_root() {
        let routes = RouteRegistry::default();
        assert_eq!(detect_base_path("/", &routes), "");
        assert_eq!(detect_base_path("/index.html", &routes), "");
        assert_eq!(detect_base_path("/section1", &routes), "");
    }

    #[test]
    fn test_base_path_on_subdirectory() {
        let routes = RouteRegistry::default();
        assert_eq!(detect_base_path("/TiddeliPWATemplate", &routes), "/TiddeliPWATemplate");
        assert_eq!(detect_base_path("/TiddeliPWATemplate/", &routes), "/TiddeliPWATemplate");
        assert_eq!(
            detect_base_path("/TiddeliPWATemplate/section2", &routes),
            "/TiddeliPWATemplate"
        );
        assert_eq!(
            detect_base_path("/TiddeliPWATemplate/index.html", &routes),
            "/TiddeliPWATemplate"
        );
    }

    #[test]
    fn test_base_path_ignores_route_segments() {
        let routes = RouteRegistry::default();
        assert_eq!(detect_base_path("/settings/", &routes), "");
    }

    #[test]
    fn test_base_path_cached_at_construction() {
        let (router, history, _) = router_at("/TiddeliPWATemplate/");
        history.push("/elsewhere/section1");
        assert_eq!(router.base_path(), "/TiddeliPWATemplate");
    }

    // === normalize_path ===

    #[test]
    fn test_normalize_index_html() {
        let (router, _, _) = router_at("/");
        assert_eq!(router.normalize_path("/index.html"), "/");
        assert_eq!(router.normalize_path("/nested/index.html"), "/");
        assert_eq!(router.normalize_path(""), "/");
        assert_eq!(router.normalize_path("/section1"), "/section1");
    }

    #[test]
    fn test_normalize_strips_base_path() {
        let (router, _, _) = router_at("/TiddeliPWATemplate/");
        assert_eq!(router.normalize_path("/TiddeliPWATemplate/"), "/");
        assert_eq!(router.normalize_path("/TiddeliPWATemplate"), "/");
        assert_eq!(router.normalize_path("/TiddeliPWATemplate/section1"), "/section1");
        assert_eq!(router.normalize_path("/TiddeliPWATemplate/index.html"), "/");
        // Segment boundary only.
        assert_eq!(router.normalize_path("/TiddeliPWATemplateX/a"), "/TiddeliPWATemplateX/a");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let (router, _, _) = router_at("/base/");
        let inputs = [
            "/",
            "",
            "/index.html",
            "/base",
            "/base/",
            "/base/base/section1",
            "/base/section2",
            "/base/index.html",
            "/other/index.html",
            "/unknown-section",
            "/basement",
        ];

        for input in inputs {
            let once = router.normalize_path(input);
            assert_eq!(router.normalize_path(&once), once, "input {:?}", input);
        }
    }

    // === navigate ===

    #[test]
    fn test_navigate_renders_route() {
        let (router, history, view) = router_at("/");

        let nav = router.navigate("/section1");

        assert_eq!(nav.route.path, "/section1");
        assert!(nav.pushed);
        assert_eq!(history.current_path(), "/section1");
        assert_eq!(view.title(), "Section 1 - Tiddeli PWA Template");
        assert!(view.main().contains("section 1 content"));
        assert_eq!(view.active_nav().as_deref(), Some("/section1"));
        assert_eq!(router.current_route(), "/section1");
    }

    #[test]
    fn test_navigate_unknown_renders_root() {
        let (router, history, view) = router_at("/");

        let nav = router.navigate("/unknown-section");

        assert_eq!(nav.route.path, "/");
        assert_eq!(view.title(), "Home - Tiddeli PWA Template");
        assert!(view.main().contains("Welcome"));
        assert_eq!(view.active_nav().as_deref(), Some("/"));
        // Already at "/", so nothing new is pushed.
        assert!(!nav.pushed);
        assert_eq!(history.entries(), vec!["/"]);
    }

    #[test]
    fn test_deploy_root_without_trailing_slash() {
        let (router, history, view) = router_at("/TiddeliPWATemplate");

        let nav = router.init();

        assert_eq!(router.base_path(), "/TiddeliPWATemplate");
        assert_eq!(nav.route.path, "/");
        assert_eq!(nav.full_path, "/TiddeliPWATemplate/");
        assert_eq!(history.entries(), vec!["/TiddeliPWATemplate", "/TiddeliPWATemplate/"]);
        assert!(view.main().contains("Welcome"));
    }

    #[test]
    fn test_unknown_path_under_base_redirects_to_base_root() {
        let (router, history, view) = router_at("/TiddeliPWATemplate/unknown-section");

        let nav = router.init();

        assert_eq!(nav.route.path, "/");
        assert_eq!(nav.full_path, "/TiddeliPWATemplate/");
        assert_eq!(history.current_path(), "/TiddeliPWATemplate/");
        assert!(view.main().contains("Welcome"));
    }

    #[test]
    fn test_navigate_same_route_does_not_push() {
        let (router, history, view) = router_at("/");

        router.navigate("/settings");
        let again = router.navigate("/settings");

        assert!(!again.pushed);
        assert_eq!(history.entries(), vec!["/", "/settings"]);
        assert_eq!(view.render_count(), 2);
    }

    #[test]
    fn test_navigate_under_base_path() {
        let (router, history, _) = router_at("/TiddeliPWATemplate/");

        let home = router.init();
        assert_eq!(home.full_path, "/TiddeliPWATemplate/");
        assert!(!home.pushed);

        let nav = router.navigate("/section2");
        assert_eq!(nav.full_path, "/TiddeliPWATemplate/section2");
        assert_eq!(history.current_path(), "/TiddeliPWATemplate/section2");

        router.navigate("/");
        assert_eq!(history.current_path(), "/TiddeliPWATemplate/");
    }

    #[test]
    fn test_init_from_index_html() {
        let (router, history, view) = router_at("/index.html");

        let nav = router.init();

        assert_eq!(nav.route.path, "/");
        assert!(nav.pushed);
        assert_eq!(history.current_path(), "/");
        assert_eq!(view.title(), "Home - Tiddeli PWA Template");
    }

    #[test]
    fn test_pop_state_follows_history() {
        let (router, history, view) = router_at("/");
        router.init();
        router.navigate("/section1");
        router.navigate("/section2");

        assert!(history.back());
        let nav = router.handle_pop_state();

        assert_eq!(nav.route.path, "/section1");
        assert!(!nav.pushed);
        assert_eq!(view.active_nav().as_deref(), Some("/section1"));
        assert_eq!(history.entries(), vec!["/", "/section1"]);
    }

    #[test]
    fn test_custom_app_name() {
        let history = MemoryHistory::new("/");
        let view = Rc::new(MemoryView::new());
        let config = AppConfig::new().with_name("Demo");
        let router = Router::new(history, view.clone()).with_config(&config);

        router.navigate("/settings");

        assert_eq!(view.title(), "Settings - Demo");
    }

    #[test]
    fn test_explicit_base_path() {
        let history = Rc::new(MemoryHistory::new("/"));
        let router = Router::new(history.clone(), MemoryView::new()).with_base_path("/app/");

        router.navigate("/app/section1");

        assert_eq!(router.base_path(), "/app");
        assert_eq!(history.current_path(), "/app/section1");
    }
}
