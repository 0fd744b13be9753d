//! Error types for the application shell.

use thiserror::Error;

/// Errors that can occur while registering the service worker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The browser has no service worker support (or the page is not a secure context).
    #[error("Service workers are not supported")]
    Unsupported,

    /// The browser rejected the registration.
    #[error("Registration rejected: {0}")]
    Rejected(String),
}
