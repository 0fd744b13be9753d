//! Install flow errors.

use thiserror::Error;

/// Replaying the deferred install prompt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    /// The platform refused to show the prompt (already used, not allowed now).
    #[error("install prompt unavailable: {0}")]
    Unavailable(String),

    /// The prompt was shown but no choice was reported.
    #[error("install prompt failed: {0}")]
    Failed(String),
}
