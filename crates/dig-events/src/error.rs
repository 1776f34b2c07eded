//! Error types for the `dig-events` crate.

/// A subscriber failed while handling an event.
///
/// The bus logs the fault and carries on with the remaining subscribers;
/// it is never propagated to the code that called `flush`.
#[derive(Debug, thiserror::Error)]
#[error("handler failed: {message}")]
pub struct HandlerError {
    /// Human-readable failure description.
    pub message: String,
}

impl HandlerError {
    /// Build a handler error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
