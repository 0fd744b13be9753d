use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use js_sys::Reflect;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{ServiceWorkerRegistration, Window};

use super::js_error;
use crate::{RegistrationError, WorkerRegistry};

type UpdateListener = Rc<dyn Fn()>;

/// `navigator.serviceWorker`.
pub struct NavigatorRegistry {
    window: Window,
    on_update_found: RefCell<Option<UpdateListener>>,
}

impl NavigatorRegistry {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            on_update_found: RefCell::new(None),
        }
    }

    /// Called on `updatefound` of the registration made by [`register`](WorkerRegistry::register).
    pub fn on_update_found(&self, listener: impl Fn() + 'static) {
        *self.on_update_found.borrow_mut() = Some(Rc::new(listener));
    }

    fn listen_for_updates(&self, registration: &ServiceWorkerRegistration) {
        let Some(listener) = self.on_update_found.borrow().clone() else {
            return;
        };
        let callback = Closure::<dyn FnMut()>::new(move || listener());
        if registration
            .add_event_listener_with_callback("updatefound", callback.as_ref().unchecked_ref())
            .is_ok()
        {
            callback.forget();
        }
    }
}

#[async_trait(?Send)]
impl WorkerRegistry for NavigatorRegistry {
    fn is_supported(&self) -> bool {
        Reflect::has(&self.window.navigator(), &JsValue::from_str("serviceWorker"))
            .unwrap_or(false)
    }

    async fn register(&self, script_url: &str) -> Result<(), RegistrationError> {
        if !self.is_supported() {
            return Err(RegistrationError::Unsupported);
        }

        let container = self.window.navigator().service_worker();
        let registration = JsFuture::from(container.register(script_url))
            .await
            .map_err(|e| RegistrationError::Rejected(js_error(&e)))?;

        if let Ok(registration) = registration.dyn_into::<ServiceWorkerRegistration>() {
            self.listen_for_updates(&registration);
        }
        Ok(())
    }
}
