//! Inference client trait.
//!
//! To add a backend, implement [`InferenceClient`] in a new file under
//! `src/ai/` and export it from `src/ai/mod.rs`.

use crate::error::InferenceError;

/// A blocking, non-streaming text completion backend.
///
/// Implementations must be `Send + Sync` so a single client can be shared
/// between the watcher and the one-shot CLI commands.
///
/// There is no retry and no cancellation: a call either returns the
/// completion or fails, and callers decide what to do with the failure.
pub trait InferenceClient: Send + Sync {
    /// Send `prompt` and return the raw completion text.
    ///
    /// # Errors
    ///
    /// - [`InferenceError::Transport`] on connection or timeout failures
    /// - [`InferenceError::Status`] on a non-2xx answer
    /// - [`InferenceError::Protocol`] when the answer lacks the completion
    fn generate(&self, prompt: &str) -> Result<String, InferenceError>;

    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Model used by this client, if the backend exposes one.
    fn model(&self) -> Option<&str> {
        None
    }
}
