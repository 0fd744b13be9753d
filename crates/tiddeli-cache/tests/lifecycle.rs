/// End-to-end worker lifecycle: install, activate, serve, upgrade, offline.
use std::rc::Rc;

use http::header::ACCEPT;
use http::{HeaderValue, Method};
use tiddeli_cache::{
    CacheKey, CacheStorage, CacheStore, FetchOutcome, FetchRequest, MemoryCacheStorage, MemoryNetwork,
    MemoryWorkerScope, Response, ServiceWorker, WorkerError, WorkerState, PRECACHE_MANIFEST,
};
use url::Url;

const ORIGIN: &str = "https://tiddeli.example";

type TestWorker = ServiceWorker<MemoryCacheStorage, Rc<MemoryNetwork>, MemoryWorkerScope>;

fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

fn worker(version: &str, storage: &MemoryCacheStorage, network: &Rc<MemoryNetwork>) -> TestWorker {
    let script = url(&format!("/sw.js?v={}", version));
    ServiceWorker::new(&script, storage.clone(), network.clone(), MemoryWorkerScope::new())
}

fn deploy(network: &MemoryNetwork, version: &str) {
    for asset in PRECACHE_MANIFEST {
        network.serve(&format!("/{}", asset), Response::ok(format!("{} @ {}", asset, version)));
    }
}

fn body(outcome: FetchOutcome) -> String {
    match outcome {
        FetchOutcome::Responded(response) => response.text(),
        FetchOutcome::Passthrough => panic!("expected a response"),
    }
}

#[tokio::test]
async fn test_upgrade_replaces_previous_store() {
    let storage = MemoryCacheStorage::new();
    let network = Rc::new(MemoryNetwork::new());

    deploy(&network, "1.0.355");
    let old = worker("1.0.355", &storage, &network);
    old.install().await;
    old.activate().await;
    assert_eq!(storage.store_names(), vec!["tiddeli-pwa-v1.0.355"]);

    deploy(&network, "1.0.356");
    let new = worker("1.0.356", &storage, &network);
    let report = new.install().await;
    assert!(report.is_complete());

    // Both stores exist between install and activate.
    assert!(storage.has_store("tiddeli-pwa-v1.0.355"));
    assert!(storage.has_store("tiddeli-pwa-v1.0.356"));

    let activation = new.activate().await;
    old.supersede();

    assert_eq!(activation.deleted, vec!["tiddeli-pwa-v1.0.355"]);
    assert_eq!(storage.store_names(), vec!["tiddeli-pwa-v1.0.356"]);
    assert_eq!(new.state(), WorkerState::Active);
    assert_eq!(old.state(), WorkerState::Redundant);

    let outcome = new.handle_fetch(&FetchRequest::get(url("/js/app.js"))).await.unwrap();
    assert_eq!(body(outcome), "js/app.js @ 1.0.356");
}

#[tokio::test]
async fn test_config_is_always_fetched_fresh() {
    let storage = MemoryCacheStorage::new();
    let network = Rc::new(MemoryNetwork::new());
    deploy(&network, "1.0.356");
    let sw = worker("1.0.356", &storage, &network);
    sw.install().await;
    sw.activate().await;

    network.serve("/js/config.js", Response::ok("window.APP_VERSION = '1.0.357'"));
    let outcome = sw.handle_fetch(&FetchRequest::get(url("/js/config.js"))).await.unwrap();

    assert_eq!(body(outcome), "window.APP_VERSION = '1.0.357'");
    // Once during install, once now.
    assert_eq!(network.request_count("/js/config.js"), 2);
}

#[tokio::test]
async fn test_static_asset_served_from_cache() {
    let storage = MemoryCacheStorage::new();
    let network = Rc::new(MemoryNetwork::new());
    let sw = worker("1.0.356", &storage, &network).with_manifest(&[]);
    sw.install().await;
    sw.activate().await;

    let store = storage.open("tiddeli-pwa-v1.0.356").await.unwrap();
    store
        .put(&CacheKey::for_url(&url("/data/items.json")), Response::ok("[1,2,3]"))
        .await
        .unwrap();

    let outcome = sw.handle_fetch(&FetchRequest::get(url("/data/items.json"))).await.unwrap();

    assert_eq!(body(outcome), "[1,2,3]");
    assert_eq!(network.request_count("/data/items.json"), 0);
}

#[tokio::test]
async fn test_offline_navigation_uses_precached_shell() {
    let storage = MemoryCacheStorage::new();
    let network = Rc::new(MemoryNetwork::new());
    deploy(&network, "1.0.356");
    let sw = worker("1.0.356", &storage, &network);
    sw.install().await;
    sw.activate().await;

    network.set_offline(true);

    let shell = sw.handle_fetch(&FetchRequest::navigate(url("/index.html"))).await.unwrap();
    assert_eq!(body(shell), "index.html @ 1.0.356");

    let err = sw
        .handle_fetch(&FetchRequest::navigate(url("/section2")))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Offline { .. }));
}

#[tokio::test]
async fn test_html_fragment_request_is_network_first() {
    let storage = MemoryCacheStorage::new();
    let network = Rc::new(MemoryNetwork::new());
    let sw = worker("1.0.356", &storage, &network).with_manifest(&[]);
    network.serve("/partials/card", Response::ok("<div>v1</div>"));

    let request = FetchRequest::get(url("/partials/card"))
        .with_header(ACCEPT, HeaderValue::from_static("text/html,application/xhtml+xml"));
    sw.handle_fetch(&request).await.unwrap();

    network.serve("/partials/card", Response::ok("<div>v2</div>"));
    let outcome = sw.handle_fetch(&request).await.unwrap();

    assert_eq!(body(outcome), "<div>v2</div>");
}

#[tokio::test]
async fn test_mutations_are_never_intercepted() {
    let storage = MemoryCacheStorage::new();
    let network = Rc::new(MemoryNetwork::new());
    let sw = worker("1.0.356", &storage, &network).with_manifest(&[]);

    let request = FetchRequest::get(url("/api/settings")).with_method(Method::PUT);
    let outcome = sw.handle_fetch(&request).await.unwrap();

    assert_eq!(outcome, FetchOutcome::Passthrough);
    assert!(network.requests().is_empty());
    assert_eq!(storage.entry_count("tiddeli-pwa-v1.0.356"), 0);
}
