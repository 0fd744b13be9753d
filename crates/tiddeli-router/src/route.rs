//! Route table.

use serde::Serialize;

/// A registered route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    /// Path relative to the deployment base (e.g. `/section1`).
    pub path: String,
    /// Page title.
    pub title: String,
    /// Component rendered into the main container.
    pub component: String,
}

impl RouteEntry {
    /// Create a route.
    pub fn new(
        path: impl Into<String>,
        title: impl Into<String>,
        component: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
            component: component.into(),
        }
    }

    /// First path segment (`section1` for `/section1`, empty for `/`).
    pub fn first_segment(&self) -> &str {
        first_segment(&self.path)
    }
}

pub(crate) fn first_segment(path: &str) -> &str {
    path.trim_start_matches('/').split('/').next().unwrap_or("")
}

/// Path of the root route.
pub const ROOT_PATH: &str = "/";

/// The application's routes.
pub const ROUTES: &[(&str, &str, &str)] = &[
    ("/", "Home", "home"),
    ("/section1", "Section 1", "section1"),
    ("/section2", "Section 2", "section2"),
    ("/settings", "Settings", "settings"),
];

/// Registry of routes keyed by path.
///
/// Exactly one route is registered for `/`; it is the fallback for every
/// unknown path.
#[derive(Debug, Clone)]
pub struct RouteRegistry {
    routes: Vec<RouteEntry>,
}

impl Default for RouteRegistry {
    fn default() -> Self {
        let mut registry = Self::new(RouteEntry::new(ROOT_PATH, "Home", "home"));
        for (path, title, component) in ROUTES.iter().skip(1) {
            registry.register(*path, *title, *component);
        }
        registry
    }
}

impl RouteRegistry {
    /// Create a registry with only the root route.
    pub fn new(root: RouteEntry) -> Self {
        let root = RouteEntry {
            path: ROOT_PATH.to_string(),
            ..root
        };
        Self { routes: vec![root] }
    }

    /// Register a route, replacing any route with the same path.
    pub fn register(
        &mut self,
        path: impl Into<String>,
        title: impl Into<String>,
        component: impl Into<String>,
    ) -> &mut Self {
        let entry = RouteEntry::new(path, title, component);
        match self.routes.iter_mut().find(|r| r.path == entry.path) {
            Some(existing) => *existing = entry,
            None => self.routes.push(entry),
        }
        self
    }

    /// Find the route for an exact path.
    pub fn get(&self, path: &str) -> Option<&RouteEntry> {
        self.routes.iter().find(|r| r.path == path)
    }

    /// The root route.
    pub fn root(&self) -> &RouteEntry {
        // `new` always installs the root route first and `register` only replaces in place.
        &self.routes[0]
    }

    /// Resolve a path, falling back to the root route.
    pub fn resolve(&self, path: &str) -> &RouteEntry {
        self.get(path).unwrap_or_else(|| self.root())
    }

    /// Whether a first path segment belongs to a registered route.
    pub fn owns_segment(&self, segment: &str) -> bool {
        !segment.is_empty() && self.routes.iter().any(|r| r.first_segment() == segment)
    }

    /// All routes, root first.
    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Always false; the root route is always present.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_routes() {
        let registry = RouteRegistry::default();

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.root().title, "Home");
        assert_eq!(registry.get("/section1").unwrap().title, "Section 1");
        assert_eq!(registry.get("/section2").unwrap().component, "section2");
        assert_eq!(registry.get("/settings").unwrap().title, "Settings");
    }

    #[test]
    fn test_unknown_resolves_to_root() {
        let registry = RouteRegistry::default();

        assert_eq!(registry.resolve("/unknown-section").path, "/");
        assert_eq!(registry.resolve("").path, "/");
        assert!(registry.get("/unknown-section").is_none());
    }

    #[test]
    fn test_register_replaces_same_path() {
        let mut registry = RouteRegistry::default();
        registry.register("/settings", "Preferences", "settings");

        assert_eq!(registry.len(), 4);
        assert_eq!(registry.get("/settings").unwrap().title, "Preferences");
    }

    #[test]
    fn test_replacing_root_keeps_it_first() {
        let mut registry = RouteRegistry::default();
        registry.register("/", "Start", "home");

        assert_eq!(registry.root().title, "Start");
        assert_eq!(registry.resolve("/nope").title, "Start");
    }

    #[test]
    fn test_new_forces_root_path() {
        let registry = RouteRegistry::new(RouteEntry::new("/home", "Home", "home"));
        assert_eq!(registry.root().path, "/");
    }

    #[test]
    fn test_owns_segment() {
        let registry = RouteRegistry::default();

        assert!(registry.owns_segment("section1"));
        assert!(registry.owns_segment("settings"));
        assert!(!registry.owns_segment("TiddeliPWATemplate"));
        assert!(!registry.owns_segment(""));
    }
}
