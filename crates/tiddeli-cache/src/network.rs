//! Network seam.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::NetworkError;
use crate::request::{FetchRequest, Response};

/// Performs real network fetches (`fetch()` in the worker).
#[async_trait(?Send)]
pub trait Network {
    /// Fetch a request. Any HTTP status is a successful fetch; only transport
    /// failures are errors.
    async fn fetch(&self, request: &FetchRequest) -> Result<Response, NetworkError>;
}

/// Scripted in-memory network (for native builds and tests).
///
/// URLs are matched on their path plus query. Unknown URLs answer `404`.
#[derive(Debug, Default)]
pub struct MemoryNetwork {
    routes: RefCell<HashMap<String, Result<Response, NetworkError>>>,
    offline: Cell<bool>,
    requests: RefCell<Vec<String>>,
}

impl MemoryNetwork {
    /// Create a network with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a response for a path.
    pub fn serve(&self, path: &str, response: Response) -> &Self {
        self.routes
            .borrow_mut()
            .insert(path.to_string(), Ok(response));
        self
    }

    /// Fail fetches of a path.
    pub fn fail(&self, path: &str, error: NetworkError) -> &Self {
        self.routes.borrow_mut().insert(path.to_string(), Err(error));
        self
    }

    /// Toggle offline mode: every fetch fails while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    /// Paths fetched so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    /// How many times a path was fetched.
    pub fn request_count(&self, path: &str) -> usize {
        self.requests.borrow().iter().filter(|p| *p == path).count()
    }
}

fn path_and_query(request: &FetchRequest) -> String {
    match request.url.query() {
        Some(query) => format!("{}?{}", request.url.path(), query),
        None => request.url.path().to_string(),
    }
}

#[async_trait(?Send)]
impl Network for MemoryNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<Response, NetworkError> {
        let path = path_and_query(request);
        self.requests.borrow_mut().push(path.clone());

        if self.offline.get() {
            return Err(NetworkError::Unreachable(path));
        }

        self.routes
            .borrow()
            .get(&path)
            .cloned()
            .unwrap_or_else(|| Ok(Response::new(http::StatusCode::NOT_FOUND, "")))
    }
}

#[async_trait(?Send)]
impl<T: Network + ?Sized> Network for std::rc::Rc<T> {
    async fn fetch(&self, request: &FetchRequest) -> Result<Response, NetworkError> {
        (**self).fetch(request).await
    }
}
