//! Browser adapters and entry points.

mod boot;
mod console;
mod dom;
mod prompt;
mod registry;
mod storage;
mod worker;

pub use boot::*;
pub use console::*;
pub use dom::*;
pub use prompt::*;
pub use registry::*;
pub use storage::*;
pub use worker::*;

use wasm_bindgen::{JsCast, JsValue};

/// Best-effort message for a thrown JS value.
pub(crate) fn js_error(value: &JsValue) -> String {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

pub(crate) fn js_anyhow(value: JsValue) -> anyhow::Error {
    anyhow::anyhow!(js_error(&value))
}
