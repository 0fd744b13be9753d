//! DOM-backed router, install UI and shell.

use js_sys::Reflect;
use tiddeli_install::InstallUi;
use tiddeli_router::{History, RouteView};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Window};

use crate::Shell;

pub const TOP_INSTALL_BUTTON: &str = "top-install-button";
pub const TOP_INSTALL_PLACEHOLDER: &str = "top-install-placeholder";
pub const INSTALL_BANNER: &str = "install-banner";
pub const BANNER_INSTALL: &str = "banner-install";
pub const BANNER_DISMISS: &str = "banner-dismiss";
pub const APP_VERSION_ID: &str = "app-version";
pub const MENU_TOGGLE: &str = "menu-toggle";
pub const DRAWER: &str = "drawer";
pub const DRAWER_BACKDROP: &str = "drawer-backdrop";

const NAV_ITEM_SELECTOR: &str = ".bottom-nav-item";
const HIDDEN: &str = "hidden";
const DRAWER_OPEN: &str = "translate-x-0";
const NAV_ACTIVE: [&str; 2] = ["bg-blue-600", "text-white"];
const NAV_INACTIVE: &str = "text-gray-600";

/// Bottom navigation items.
pub fn nav_items(document: &Document) -> Vec<Element> {
    let Ok(list) = document.query_selector_all(NAV_ITEM_SELECTOR) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.get(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn show(document: &Document, id: &str) {
    if let Some(element) = document.get_element_by_id(id) {
        let _ = element.class_list().remove_1(HIDDEN);
    }
}

fn hide(document: &Document, id: &str) {
    if let Some(element) = document.get_element_by_id(id) {
        let _ = element.class_list().add_1(HIDDEN);
    }
}

/// `window.location` + `window.history`.
pub struct DomHistory {
    window: Window,
}

impl DomHistory {
    pub fn new(window: Window) -> Self {
        Self { window }
    }
}

impl History for DomHistory {
    fn current_path(&self) -> String {
        self.window
            .location()
            .pathname()
            .unwrap_or_else(|_| "/".to_string())
    }

    fn push(&self, path: &str) {
        if let Ok(history) = self.window.history() {
            let _ = history.push_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

/// Renders routes into `<main>` and the bottom navigation.
pub struct DomView {
    document: Document,
}

impl DomView {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl RouteView for DomView {
    fn set_title(&self, title: &str) {
        self.document.set_title(title);
    }

    fn render_main(&self, html: &str) {
        if let Ok(Some(main)) = self.document.query_selector("main") {
            main.set_inner_html(html);
        }
    }

    fn highlight_nav(&self, active_route: &str) {
        for item in nav_items(&self.document) {
            let classes = item.class_list();
            if item.get_attribute("data-route").as_deref() == Some(active_route) {
                let _ = classes.add_2(NAV_ACTIVE[0], NAV_ACTIVE[1]);
                let _ = classes.remove_1(NAV_INACTIVE);
            } else {
                let _ = classes.remove_2(NAV_ACTIVE[0], NAV_ACTIVE[1]);
                let _ = classes.add_1(NAV_INACTIVE);
            }
        }
    }
}

/// Install button, placeholder and banner, toggled with the `hidden` class.
pub struct DomInstallUi {
    window: Window,
    document: Document,
}

impl DomInstallUi {
    pub fn new(window: Window, document: Document) -> Self {
        Self { window, document }
    }
}

impl InstallUi for DomInstallUi {
    fn show_top_button(&self) {
        show(&self.document, TOP_INSTALL_BUTTON);
        hide(&self.document, TOP_INSTALL_PLACEHOLDER);
    }

    fn hide_top_button(&self) {
        hide(&self.document, TOP_INSTALL_BUTTON);
        show(&self.document, TOP_INSTALL_PLACEHOLDER);
    }

    fn show_banner(&self, install_available: bool) {
        show(&self.document, INSTALL_BANNER);
        if install_available {
            show(&self.document, BANNER_INSTALL);
        } else {
            hide(&self.document, BANNER_INSTALL);
        }
    }

    fn hide_banner(&self) {
        hide(&self.document, INSTALL_BANNER);
    }

    fn reveal_banner_install(&self) {
        show(&self.document, BANNER_INSTALL);
    }

    fn is_standalone(&self) -> bool {
        let display_mode = self
            .window
            .match_media("(display-mode: standalone)")
            .ok()
            .flatten()
            .map(|query| query.matches())
            .unwrap_or(false);

        // iOS Safari reports home-screen launches through `navigator.standalone`.
        let ios_standalone = Reflect::get(&self.window.navigator(), &JsValue::from_str("standalone"))
            .ok()
            .and_then(|value| value.as_bool())
            .unwrap_or(false);

        display_mode || ios_standalone
    }
}

/// Version label, drawer and page reload.
pub struct DomShell {
    window: Window,
    document: Document,
}

impl DomShell {
    pub fn new(window: Window, document: Document) -> Self {
        Self { window, document }
    }
}

impl Shell for DomShell {
    fn set_version(&self, version: &str) {
        if let Some(label) = self.document.get_element_by_id(APP_VERSION_ID) {
            label.set_text_content(Some(version));
        }
    }

    fn open_drawer(&self) {
        if let Some(drawer) = self.document.get_element_by_id(DRAWER) {
            let _ = drawer.class_list().add_1(DRAWER_OPEN);
        }
        show(&self.document, DRAWER_BACKDROP);
    }

    fn close_drawer(&self) {
        if let Some(drawer) = self.document.get_element_by_id(DRAWER) {
            let _ = drawer.class_list().remove_1(DRAWER_OPEN);
        }
        hide(&self.document, DRAWER_BACKDROP);
    }

    fn reload(&self) {
        let _ = self.window.location().reload();
    }
}
