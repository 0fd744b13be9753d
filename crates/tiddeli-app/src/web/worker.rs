//! Cache Storage, fetch and lifecycle adapters for the service worker global scope.

use async_trait::async_trait;
use http::header::HeaderName;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use js_sys::{Array, Object, Reflect, Uint8Array};
use tiddeli_cache::{
    CacheError, CacheKey, CacheResult, CacheStorage, CacheStore, Destination, FetchRequest,
    Network, NetworkError, RequestMode, Response, WorkerError, WorkerScope,
};
use url::Url;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, RequestInit, ResponseInit, ServiceWorkerGlobalScope};

use super::js_error;

/// `caches` of the worker scope.
pub struct WorkerCaches {
    caches: web_sys::CacheStorage,
}

impl WorkerCaches {
    pub fn new(caches: web_sys::CacheStorage) -> Self {
        Self { caches }
    }
}

#[async_trait(?Send)]
impl CacheStorage for WorkerCaches {
    type Store = WorkerCache;

    async fn open(&self, name: &str) -> CacheResult<WorkerCache> {
        let open_error = |reason: String| CacheError::Open {
            name: name.to_string(),
            reason,
        };
        let cache = JsFuture::from(self.caches.open(name))
            .await
            .map_err(|e| open_error(js_error(&e)))?;
        let cache = cache
            .dyn_into::<web_sys::Cache>()
            .map_err(|_| open_error("not a Cache".into()))?;
        Ok(WorkerCache { cache })
    }

    async fn names(&self) -> CacheResult<Vec<String>> {
        let names = JsFuture::from(self.caches.keys())
            .await
            .map_err(|e| CacheError::Read(js_error(&e)))?;
        let names = names
            .dyn_into::<Array>()
            .map_err(|_| CacheError::Read("caches.keys() did not return an array".into()))?;
        Ok(names.iter().filter_map(|name| name.as_string()).collect())
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        let existed = JsFuture::from(self.caches.delete(name))
            .await
            .map_err(|e| CacheError::Delete {
                name: name.to_string(),
                reason: js_error(&e),
            })?;
        Ok(existed.as_bool().unwrap_or(false))
    }
}

/// One opened `Cache`.
pub struct WorkerCache {
    cache: web_sys::Cache,
}

#[async_trait(?Send)]
impl CacheStore for WorkerCache {
    async fn lookup(&self, key: &CacheKey) -> CacheResult<Option<Response>> {
        let found = JsFuture::from(self.cache.match_with_str(key.as_str()))
            .await
            .map_err(|e| CacheError::Read(js_error(&e)))?;
        if found.is_undefined() {
            return Ok(None);
        }

        let found = found
            .dyn_into::<web_sys::Response>()
            .map_err(|_| CacheError::Read(format!("{} is not a Response", key)))?;
        read_response(&found).await.map(Some).map_err(CacheError::Read)
    }

    async fn put(&self, key: &CacheKey, response: Response) -> CacheResult<()> {
        let response = to_js_response(&response).map_err(|e| CacheError::Write(js_error(&e)))?;
        JsFuture::from(self.cache.put_with_str(key.as_str(), &response))
            .await
            .map_err(|e| CacheError::Write(js_error(&e)))?;
        Ok(())
    }
}

/// `fetch()` of the worker scope, used for the pre-cache manifest.
pub struct WorkerFetch {
    scope: ServiceWorkerGlobalScope,
}

impl WorkerFetch {
    pub fn new(scope: ServiceWorkerGlobalScope) -> Self {
        Self { scope }
    }
}

#[async_trait(?Send)]
impl Network for WorkerFetch {
    async fn fetch(&self, request: &FetchRequest) -> Result<Response, NetworkError> {
        let rejected = |e: JsValue| NetworkError::Rejected(js_error(&e));

        let headers = Headers::new().map_err(rejected)?;
        for (name, value) in &request.headers {
            if let Ok(value) = value.to_str() {
                headers.append(name.as_str(), value).map_err(rejected)?;
            }
        }

        let init = RequestInit::new();
        init.set_method(request.method.as_str());
        init.set_headers(&headers);
        let js_request = web_sys::Request::new_with_str_and_init(request.url.as_str(), &init)
            .map_err(rejected)?;

        let response = JsFuture::from(self.scope.fetch_with_request(&js_request))
            .await
            .map_err(|e| NetworkError::Unreachable(js_error(&e)))?;
        let response = response
            .dyn_into::<web_sys::Response>()
            .map_err(|_| NetworkError::Rejected("fetch did not return a Response".into()))?;

        read_response(&response).await.map_err(NetworkError::Rejected)
    }
}

/// Fetches one intercepted request as the page issued it.
///
/// Headers (`Range`, `If-None-Match`, ...), mode, credentials and redirect
/// handling are those of the original request; the converted
/// [`FetchRequest`] is ignored apart from classification and cache keying
/// done by the caller.
pub struct EventFetch {
    scope: ServiceWorkerGlobalScope,
    request: web_sys::Request,
}

impl EventFetch {
    pub fn new(scope: ServiceWorkerGlobalScope, request: web_sys::Request) -> Self {
        Self { scope, request }
    }
}

#[async_trait(?Send)]
impl Network for EventFetch {
    async fn fetch(&self, _request: &FetchRequest) -> Result<Response, NetworkError> {
        let response = JsFuture::from(self.scope.fetch_with_request(&self.request))
            .await
            .map_err(|e| NetworkError::Unreachable(js_error(&e)))?;
        let response = response
            .dyn_into::<web_sys::Response>()
            .map_err(|_| NetworkError::Rejected("fetch did not return a Response".into()))?;

        read_response(&response).await.map_err(NetworkError::Rejected)
    }
}

/// `skipWaiting()` and `clients.claim()`.
pub struct WorkerHooks {
    scope: ServiceWorkerGlobalScope,
}

impl WorkerHooks {
    pub fn new(scope: ServiceWorkerGlobalScope) -> Self {
        Self { scope }
    }
}

#[async_trait(?Send)]
impl WorkerScope for WorkerHooks {
    async fn skip_waiting(&self) -> Result<(), WorkerError> {
        let lifecycle = |e: JsValue| WorkerError::Lifecycle(js_error(&e));
        let promise = self.scope.skip_waiting().map_err(lifecycle)?;
        JsFuture::from(promise).await.map_err(lifecycle)?;
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), WorkerError> {
        JsFuture::from(self.scope.clients().claim())
            .await
            .map_err(|e| WorkerError::Lifecycle(js_error(&e)))?;
        Ok(())
    }
}

/// Convert the request of a `FetchEvent`. `None` for URLs or methods that cannot be represented.
pub fn fetch_request_from(request: &web_sys::Request) -> Option<FetchRequest> {
    let url = Url::parse(&request.url()).ok()?;
    let method = Method::from_bytes(request.method().as_bytes()).ok()?;

    let string_member = |name: &str| {
        Reflect::get(request, &JsValue::from_str(name))
            .ok()
            .and_then(|value| value.as_string())
            .unwrap_or_default()
    };

    let mut converted = FetchRequest::get(url)
        .with_method(method)
        .with_mode(RequestMode::parse(&string_member("mode")))
        .with_destination(Destination::parse(&string_member("destination")));
    converted.headers = header_map(&request.headers());
    Some(converted)
}

fn header_map(headers: &Headers) -> HeaderMap {
    let mut map = HeaderMap::new();
    let Ok(Some(entries)) = js_sys::try_iter(headers) else {
        return map;
    };
    for entry in entries.flatten() {
        let pair: Array = entry.unchecked_into();
        let (Some(name), Some(value)) = (pair.get(0).as_string(), pair.get(1).as_string()) else {
            continue;
        };
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            map.append(name, value);
        }
    }
    map
}

/// Read status, headers and body of a platform response.
async fn read_response(response: &web_sys::Response) -> Result<Response, String> {
    let status = StatusCode::from_u16(response.status()).map_err(|e| e.to_string())?;

    let buffer = response.array_buffer().map_err(|e| js_error(&e))?;
    let buffer = JsFuture::from(buffer).await.map_err(|e| js_error(&e))?;
    let body = Uint8Array::new(&buffer).to_vec();

    let mut converted = Response::new(status, body);
    converted.headers = header_map(&response.headers());
    Ok(converted)
}

/// Build a platform response to hand to `respondWith` or `cache.put`.
pub fn to_js_response(response: &Response) -> Result<web_sys::Response, JsValue> {
    let headers = Headers::new()?;
    for (name, value) in &response.headers {
        if let Ok(value) = value.to_str() {
            headers.append(name.as_str(), value)?;
        }
    }

    let init = ResponseInit::new();
    init.set_status(response.status.as_u16());
    init.set_headers(&headers);

    // Null-body statuses (204, 304) reject any body, even an empty one.
    if response.body.is_empty() {
        return web_sys::Response::new_with_opt_buffer_source_and_init(None, &init);
    }
    let body: Object = Uint8Array::from(response.body.as_slice()).into();
    web_sys::Response::new_with_opt_buffer_source_and_init(Some(&body), &init)
}
