//! Structured logging for the Tiddeli PWA.
//!
//! This crate provides:
//! - `StructuredLogger` - Component-scoped structured logging
//! - `LogSink` - Where log entries go (`tracing`, memory, browser console)

mod logging;
mod sink;

pub use logging::*;
pub use sink::*;
