//! Error types for the game server binary.

/// Top-level startup error.
///
/// Each variant wraps one subsystem's error so `main` can propagate with
/// `?`.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: atomic_core::ConfigError,
    },

    /// The built-in catalog failed validation.
    #[error("catalog error: {source}")]
    Catalog {
        /// The underlying catalog error.
        #[from]
        source: atomic_catalog::CatalogError,
    },

    /// The account store could not be opened.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: atomic_db::DbError,
    },

    /// The HTTP API failed to start or crashed.
    #[error("api error: {source}")]
    Api {
        /// The underlying server error.
        #[from]
        source: atomic_api::ServerError,
    },
}
