//! `#[wasm_bindgen]` entry points for the page and the worker script.

use std::rc::Rc;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tiddeli_cache::ServiceWorker;
use tiddeli_core::{version_from_script_url, AppConfig, SystemClock};
use tiddeli_install::{BannerPolicy, InstallController, InstallSource};
use tiddeli_observability::StructuredLogger;
use tiddeli_router::Router;
use js_sys::Promise;
use url::Url;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local};
use web_sys::{
    Document, Event, EventTarget, ExtendableEvent, FetchEvent,
    ServiceWorkerGlobalScope, ServiceWorkerState, Window,
};

use super::{
    fetch_request_from, js_anyhow, js_error, nav_items, to_js_response, BeforeInstallPrompt,
    ConsoleSink, DomHistory, DomInstallUi, DomShell, DomView, EventFetch, LocalStorage,
    NavigatorRegistry, WorkerCaches, WorkerFetch, WorkerHooks, BANNER_DISMISS, BANNER_INSTALL, DRAWER_BACKDROP,
    MENU_TOGGLE, TOP_INSTALL_BUTTON,
};
use crate::{App, WorkerRegistry};

type PageInstall = InstallController<BeforeInstallPrompt, DomInstallUi, LocalStorage, SystemClock>;
type PageRouter = Router<DomHistory, DomView>;
type PageApp = App<Rc<NavigatorRegistry>, DomShell>;
type BrowserWorker = ServiceWorker<WorkerCaches, WorkerFetch, WorkerHooks>;

/// Start the application in a document.
#[wasm_bindgen]
pub fn boot_document() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    start_document().map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}

/// Start the service worker. Call from the worker script's top level.
#[wasm_bindgen]
pub fn boot_worker() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    start_worker().map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}

fn logger(config: &AppConfig) -> StructuredLogger {
    StructuredLogger::new("tiddeli")
        .with_version(config.version.clone())
        .with_sink(Arc::new(ConsoleSink))
}

fn listen<T>(target: &T, event: &str, handler: impl FnMut(Event) + 'static) -> anyhow::Result<()>
where
    T: AsRef<EventTarget>,
{
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target
        .as_ref()
        .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
        .map_err(js_anyhow)
        .with_context(|| format!("failed to listen for {}", event))?;
    closure.forget();
    Ok(())
}

fn listen_click(document: &Document, id: &str, handler: impl FnMut(Event) + 'static) -> anyhow::Result<()> {
    match document.get_element_by_id(id) {
        Some(element) => listen(&element, "click", handler),
        None => Ok(()),
    }
}

fn start_document() -> anyhow::Result<()> {
    let window = web_sys::window().context("no window")?;
    let document = window.document().context("no document")?;
    let config = AppConfig::new();
    let logger = logger(&config);

    let install: Rc<PageInstall> = Rc::new(
        InstallController::new(
            BannerPolicy::new(LocalStorage::new(&window), SystemClock, config.version.clone()),
            DomInstallUi::new(window.clone(), document.clone()),
        )
        .with_logger(logger.clone()),
    );

    // The platform fires beforeinstallprompt once, possibly before setup.
    listen(&window, "beforeinstallprompt", {
        let install = install.clone();
        move |event: Event| {
            event.prevent_default();
            install.capture(BeforeInstallPrompt::new(event));
        }
    })?;
    listen(&window, "appinstalled", {
        let install = install.clone();
        move |_| install.on_app_installed()
    })?;

    // Everything below needs the page's elements.
    if document.ready_state() == "loading" {
        let target = document.clone();
        let ready = Closure::once_into_js(move |_: Event| {
            if let Err(e) = start_page(&window, &document, config, &logger, &install) {
                logger.error_with("Startup failed", &[("error", &format!("{:#}", e))]);
            }
        });
        target
            .add_event_listener_with_callback("DOMContentLoaded", ready.unchecked_ref())
            .map_err(js_anyhow)
            .context("failed to listen for DOMContentLoaded")?;
        return Ok(());
    }

    start_page(&window, &document, config, &logger, &install)
}

/// Render the first route, wire the page controls and register the worker.
fn start_page(
    window: &Window,
    document: &Document,
    config: AppConfig,
    logger: &StructuredLogger,
    install: &Rc<PageInstall>,
) -> anyhow::Result<()> {
    let router: Rc<PageRouter> = Rc::new(
        Router::new(DomHistory::new(window.clone()), DomView::new(document.clone()))
            .with_config(&config)
            .with_logger(logger.clone()),
    );

    let registry = Rc::new(NavigatorRegistry::new(window.clone()));
    let app: Rc<PageApp> = Rc::new(
        App::new(
            config,
            registry.clone(),
            DomShell::new(window.clone(), document.clone()),
        )
        .with_logger(logger.clone()),
    );
    registry.on_update_found({
        let app = app.clone();
        move || app.on_update_found()
    });

    app.start(&router, install);

    listen(window, "popstate", {
        let router = router.clone();
        move |_| {
            router.handle_pop_state();
        }
    })?;
    wire_navigation(document, &router)?;
    wire_install(document, install)?;
    wire_drawer(document, &app)?;

    if registry.is_supported() {
        listen(&window.navigator().service_worker(), "controllerchange", {
            let app = app.clone();
            move |_| {
                app.on_controller_change();
            }
        })?;
    }

    spawn_local(async move {
        app.register_worker().await;
    });
    Ok(())
}

fn wire_navigation(document: &Document, router: &Rc<PageRouter>) -> anyhow::Result<()> {
    for item in nav_items(document) {
        let router = router.clone();
        let target = item.clone();
        listen(&item, "click", move |event: Event| {
            event.prevent_default();
            event.stop_propagation();
            if let Some(route) = target.get_attribute("data-route") {
                router.navigate(&route);
            }
        })?;
    }
    Ok(())
}

fn wire_install(document: &Document, install: &Rc<PageInstall>) -> anyhow::Result<()> {
    for (id, source) in [
        (TOP_INSTALL_BUTTON, InstallSource::Top),
        (BANNER_INSTALL, InstallSource::Banner),
    ] {
        let install = install.clone();
        listen_click(document, id, move |_| {
            let install = install.clone();
            // Failures are logged and reflected in the install state.
            spawn_local(async move {
                let _ = install.accept(source).await;
            });
        })?;
    }

    let install = install.clone();
    listen_click(document, BANNER_DISMISS, move |_| install.dismiss())
}

fn wire_drawer(document: &Document, app: &Rc<PageApp>) -> anyhow::Result<()> {
    listen_click(document, MENU_TOGGLE, {
        let app = app.clone();
        move |_| app.open_drawer()
    })?;
    listen_click(document, DRAWER_BACKDROP, {
        let app = app.clone();
        move |_| app.close_drawer()
    })
}

fn start_worker() -> anyhow::Result<()> {
    let scope: ServiceWorkerGlobalScope = js_sys::global()
        .dyn_into()
        .map_err(|_| anyhow!("not running in a service worker"))?;
    let script_url = scope.location().href();
    let script_url = Url::parse(&script_url)
        .with_context(|| format!("invalid worker script URL {}", script_url))?;
    let caches = scope.caches().map_err(js_anyhow)?;

    let config = AppConfig::new().with_version(version_from_script_url(script_url.as_str()));
    let logger = logger(&config).child("service-worker");
    let worker: Rc<BrowserWorker> = Rc::new(
        ServiceWorker::new(
            &script_url,
            WorkerCaches::new(caches),
            WorkerFetch::new(scope.clone()),
            WorkerHooks::new(scope.clone()),
        )
        .with_logger(logger.clone()),
    );

    listen(&scope, "install", {
        let worker = worker.clone();
        let logger = logger.clone();
        move |event: Event| {
            let worker = worker.clone();
            let done = future_to_promise(async move {
                worker.install().await;
                Ok(JsValue::UNDEFINED)
            });
            extend_lifetime(&event, &done, &logger);
        }
    })?;

    listen(&scope, "activate", {
        let worker = worker.clone();
        let logger = logger.clone();
        move |event: Event| {
            let worker = worker.clone();
            let done = future_to_promise(async move {
                worker.activate().await;
                Ok(JsValue::UNDEFINED)
            });
            extend_lifetime(&event, &done, &logger);
        }
    })?;

    listen(&scope, "fetch", {
        let worker = worker.clone();
        let scope = scope.clone();
        let logger = logger.clone();
        move |event: Event| {
            let Some(event) = event.dyn_ref::<FetchEvent>() else {
                return;
            };
            let original = event.request();
            let Some(request) = fetch_request_from(&original) else {
                return;
            };
            // Cross-origin responses are opaque to the worker; leave them to the browser.
            if request.url.origin() != worker.scope().origin() {
                return;
            }
            let Some(strategy) = worker.strategy_for(&request) else {
                return;
            };

            let worker = worker.clone();
            let network = EventFetch::new(scope.clone(), original);
            let response = future_to_promise(async move {
                let response = worker
                    .respond_using(&request, strategy, &network)
                    .await
                    .map_err(|e| JsValue::from(js_sys::Error::new(&e.to_string())))?;
                to_js_response(&response).map(JsValue::from)
            });
            if let Err(e) = event.respond_with(&response) {
                logger.warn_with("respondWith rejected", &[("error", &js_error(&e))]);
            }
        }
    })?;

    watch_for_successor(&scope, &worker, &script_url, &logger)
}

/// Keep the worker alive until `done` settles (`ExtendableEvent.waitUntil`).
fn extend_lifetime(event: &Event, done: &Promise, logger: &StructuredLogger) {
    let Some(event) = event.dyn_ref::<ExtendableEvent>() else {
        logger.warn_with("Not an extendable event", &[("type", &event.type_())]);
        return;
    };
    if let Err(e) = event.wait_until(done) {
        logger.error_with(
            "waitUntil rejected",
            &[("type", &event.type_()), ("error", &js_error(&e))],
        );
    }
}

/// Mark the worker redundant once a worker with another script URL activates
/// on the same registration.
fn watch_for_successor(
    scope: &ServiceWorkerGlobalScope,
    worker: &Rc<BrowserWorker>,
    script_url: &Url,
    logger: &StructuredLogger,
) -> anyhow::Result<()> {
    let registration = scope.registration();
    let own_script = script_url.to_string();
    let target = registration.clone();
    let worker = worker.clone();
    let logger = logger.clone();

    listen(&target, "updatefound", move |_| {
        let Some(successor) = registration.installing() else {
            return;
        };
        if successor.script_url() == own_script {
            return;
        }

        let worker = worker.clone();
        let watched = successor.clone();
        let watching = listen(&successor, "statechange", move |_| {
            if watched.state() == ServiceWorkerState::Activated {
                worker.supersede();
            }
        });
        if let Err(e) = watching {
            logger.warn_with("Cannot watch newer worker", &[("error", &format!("{:#}", e))]);
        }
    })
}
