use async_trait::async_trait;
use js_sys::{Function, Promise, Reflect};
use tiddeli_install::{InstallOutcome, InstallPrompt, PromptError};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::Event;

use super::js_error;

/// A captured `beforeinstallprompt` event.
///
/// `BeforeInstallPromptEvent` is not part of the standard bindings, so its
/// `prompt()` and `userChoice` members are reached through reflection.
pub struct BeforeInstallPrompt {
    event: Event,
}

impl BeforeInstallPrompt {
    pub fn new(event: Event) -> Self {
        Self { event }
    }

    fn member(&self, name: &str) -> Result<JsValue, JsValue> {
        Reflect::get(&self.event, &JsValue::from_str(name))
    }
}

#[async_trait(?Send)]
impl InstallPrompt for BeforeInstallPrompt {
    async fn prompt(&self) -> Result<InstallOutcome, PromptError> {
        let prompt: Function = self
            .member("prompt")
            .ok()
            .and_then(|value| value.dyn_into().ok())
            .ok_or_else(|| PromptError::Unavailable("event has no prompt()".into()))?;

        prompt
            .call0(&self.event)
            .map_err(|e| PromptError::Unavailable(js_error(&e)))?;

        let choice: Promise = self
            .member("userChoice")
            .ok()
            .and_then(|value| value.dyn_into().ok())
            .ok_or_else(|| PromptError::Failed("event has no userChoice".into()))?;

        let choice = JsFuture::from(choice)
            .await
            .map_err(|e| PromptError::Failed(js_error(&e)))?;

        let outcome = Reflect::get(&choice, &JsValue::from_str("outcome"))
            .ok()
            .and_then(|value| value.as_string())
            .unwrap_or_default();

        Ok(InstallOutcome::parse(&outcome))
    }
}
