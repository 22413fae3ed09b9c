//! Error types for product synchronization.
//!
//! # Design
//! The first four variants follow the failure taxonomy operators act on:
//! configuration (fix the settings), transport (possibly transient),
//! protocol (the upstream answered but not usefully) and missing identifier
//! (a data-quality issue on the product). Every variant keeps the text of
//! the underlying cause, because that text is what ends up in the product's
//! sync message.

use thiserror::Error;
use uuid::Uuid;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors returned by the API client, the store and the sync service.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A required setting is missing, e.g. the bearer token.
    #[error("configuration error: {0}")]
    Config(String),

    /// The HTTP call could not complete or returned a non-2xx status.
    #[error("failed to connect to API: {0}")]
    Transport(String),

    /// The body was not valid JSON or the envelope did not report success.
    #[error("invalid API response: {0}")]
    Protocol(String),

    /// Neither an article reference nor an item number is set on the product.
    #[error("no barcode or item number found for product '{product}'")]
    MissingIdentifier { product: String },

    #[error("product {0} not found")]
    ProductNotFound(Uuid),

    /// Another batch run is still active on the same service.
    #[error("a batch synchronization is already running")]
    BatchInProgress,
}

impl SyncError {
    /// Only transport failures may succeed on a later attempt without
    /// operator intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Transport(_))
    }
}
