//! Error types for the engine binary.
//!
//! [`EngineError`] is the single error type `main` propagates with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: dig_core::ConfigError,
    },

    /// Session construction or an action failed.
    #[error("session error: {source}")]
    Session {
        /// The underlying session error.
        #[from]
        source: dig_core::SessionError,
    },

    /// The log filter could not be built.
    #[error("invalid log filter {filter:?}: {message}")]
    LogFilter {
        /// The rejected filter directive.
        filter: String,
        /// Parser message.
        message: String,
    },
}
