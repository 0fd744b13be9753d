use tiddeli_observability::{LogEntry, LogLevel, LogSink};
use wasm_bindgen::JsValue;
use web_sys::console;

/// Writes log lines to the browser console at the matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn write(&self, entry: &LogEntry, formatted: &str) {
        let line = JsValue::from_str(formatted);
        match entry.level {
            LogLevel::Trace | LogLevel::Debug => console::debug_1(&line),
            LogLevel::Info => console::log_1(&line),
            LogLevel::Warn => console::warn_1(&line),
            LogLevel::Error => console::error_1(&line),
        }
    }
}
