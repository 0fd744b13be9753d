/// Page startup with in-memory platform fakes.
use std::rc::Rc;
use std::sync::Arc;

use tiddeli_app::prelude::*;
use tiddeli_app::{MemoryShell, MemoryWorkerRegistry};
use tiddeli_core::{ManualClock, MemoryStore};
use tiddeli_install::{InstallOutcome, MemoryInstallUi, ScriptedPrompt};
use tiddeli_observability::MemorySink;
use tiddeli_router::{MemoryHistory, MemoryView};

struct Page {
    app: App<Rc<MemoryWorkerRegistry>, Rc<MemoryShell>>,
    router: Router<Rc<MemoryHistory>, Rc<MemoryView>>,
    install: InstallController<ScriptedPrompt, Rc<MemoryInstallUi>, Rc<MemoryStore>, Rc<ManualClock>>,
    registry: Rc<MemoryWorkerRegistry>,
    shell: Rc<MemoryShell>,
    history: Rc<MemoryHistory>,
    view: Rc<MemoryView>,
    ui: Rc<MemoryInstallUi>,
    sink: Arc<MemorySink>,
}

fn page(path: &str, registry: MemoryWorkerRegistry) -> Page {
    let config = AppConfig::new();
    let sink = Arc::new(MemorySink::new());
    let logger = StructuredLogger::new("tiddeli").with_sink(sink.clone());

    let history = Rc::new(MemoryHistory::new(path));
    let view = Rc::new(MemoryView::new());
    let router = Router::new(history.clone(), view.clone())
        .with_config(&config)
        .with_logger(logger.clone());

    let ui = Rc::new(MemoryInstallUi::new());
    let policy = BannerPolicy::new(
        Rc::new(MemoryStore::new()),
        Rc::new(ManualClock::at_millis(1_700_000_000_000)),
        config.version.clone(),
    );
    let install = InstallController::new(policy, ui.clone()).with_logger(logger.clone());

    let registry = Rc::new(registry);
    let shell = Rc::new(MemoryShell::new());
    let app = App::new(config, registry.clone(), shell.clone()).with_logger(logger);

    Page {
        app,
        router,
        install,
        registry,
        shell,
        history,
        view,
        ui,
        sink,
    }
}

#[tokio::test]
async fn test_first_load_at_origin_root() {
    let page = page("/", MemoryWorkerRegistry::new());

    page.app.start(&page.router, &page.install);
    let support = page.app.register_worker().await;

    assert_eq!(page.shell.version().as_deref(), Some(APP_VERSION));
    assert!(page.ui.banner_visible());
    assert!(!page.ui.banner_install_visible());
    assert_eq!(page.router.current_route(), "/");
    assert!(page.view.main().contains("Welcome"));
    assert_eq!(page.view.active_nav().as_deref(), Some("/"));
    assert_eq!(support, OfflineSupport::Available);
    assert_eq!(page.registry.registered(), vec![format!("/sw.js?v={}", APP_VERSION)]);
    assert!(page.sink.contains(&format!("{} v{} initialized", APP_NAME, APP_VERSION)));
}

#[tokio::test]
async fn test_deep_link_under_base_path() {
    let page = page("/tiddeli/section2", MemoryWorkerRegistry::new());

    page.app.start(&page.router, &page.install);

    assert_eq!(page.router.base_path(), "/tiddeli");
    assert_eq!(page.router.current_route(), "/section2");
    assert!(page.view.title().starts_with("Section 2"));
    assert_eq!(page.history.entries().last().map(String::as_str), Some("/tiddeli/section2"));
}

#[tokio::test]
async fn test_prompt_before_start_reveals_install_on_setup() {
    let page = page("/", MemoryWorkerRegistry::new());

    page.install.capture(ScriptedPrompt::answering(InstallOutcome::Accepted));
    assert!(!page.ui.top_button_visible());

    page.app.start(&page.router, &page.install);
    assert!(page.ui.top_button_visible());
    assert!(page.ui.banner_install_visible());

    let outcome = page.install.accept(InstallSource::Top).await.unwrap();
    assert_eq!(outcome, Some(InstallOutcome::Accepted));
    assert_eq!(page.install.state(), InstallState::Accepted);
    assert!(!page.ui.banner_visible());
}

#[tokio::test]
async fn test_app_keeps_running_without_worker() {
    let page = page("/settings", MemoryWorkerRegistry::rejecting("SecurityError"));

    page.app.start(&page.router, &page.install);
    let support = page.app.register_worker().await;

    assert_eq!(support, OfflineSupport::Unavailable);
    assert_eq!(page.router.current_route(), "/settings");

    page.router.navigate("/section1");
    assert_eq!(page.router.current_route(), "/section1");
    assert!(page.view.main().contains("Section 1"));
}

#[tokio::test]
async fn test_worker_update_reloads_once() {
    let page = page("/", MemoryWorkerRegistry::new());
    page.app.start(&page.router, &page.install);
    page.app.register_worker().await;

    page.app.on_update_found();
    page.app.on_controller_change();
    page.app.on_controller_change();

    assert_eq!(page.shell.reloads(), 1);
}
