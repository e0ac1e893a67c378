//! Error types for the data layer.
//!
//! All errors are propagated via [`DbError`] which wraps the underlying
//! [`sqlx`] and [`fred`] errors with additional context about which
//! operation failed.

use atomic_types::AccountId;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// A serialization or deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No account with the given id exists.
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    /// A stored row could not be mapped back to a domain type.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// A value does not fit its `PostgreSQL` column; nothing was written.
    #[error("{column} = {value} does not fit its column: {reason}")]
    OutOfRange {
        /// The column being written.
        column: &'static str,
        /// The rejected value.
        value: u64,
        /// Conversion failure detail.
        reason: String,
    },

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
