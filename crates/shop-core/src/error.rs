//! # Shop Error Types
//!
//! Typed error handling for the storefront backend.
//! Every flow returns `Result<T, ShopError>`; the HTTP layer maps each
//! variant onto a status code with [`ShopError::status_code`].

use thiserror::Error;

/// Core error type for all storefront operations
#[derive(Debug, Error)]
pub enum ShopError {
    /// Missing or malformed input
    #[error("{0}")]
    Validation(String),

    /// Wrong email/password combination on login
    #[error("{0}")]
    InvalidCredentials(String),

    /// Missing, tampered or expired identity token
    #[error("{0}")]
    Unauthenticated(String),

    /// Authenticated, but the role does not allow the action
    #[error("{0}")]
    Forbidden(String),

    /// Record not found
    #[error("{0}")]
    NotFound(String),

    /// Unique field already taken (duplicate email)
    #[error("{0}")]
    Conflict(String),

    /// Payment provider API or network error
    #[error("Provider error [{provider}]: {message}")]
    Upstream { provider: String, message: String },

    /// Credential or order store failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShopError {
    /// Shorthand for a validation failure
    pub fn validation(message: impl Into<String>) -> Self {
        ShopError::Validation(message.into())
    }

    /// Shorthand for a token/authentication failure
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ShopError::Unauthenticated(message.into())
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ShopError::Validation(_) => 400,
            ShopError::InvalidCredentials(_) => 400,
            ShopError::Unauthenticated(_) => 401,
            ShopError::Forbidden(_) => 403,
            ShopError::NotFound(_) => 404,
            ShopError::Conflict(_) => 409,
            ShopError::Upstream { .. } => 500,
            ShopError::Storage(_) => 500,
            ShopError::Configuration(_) => 500,
            ShopError::Serialization(_) => 500,
            ShopError::Internal(_) => 500,
        }
    }

    /// True for faults on our side or upstream, as opposed to bad client input
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

/// Result type alias for storefront operations
pub type ShopResult<T> = Result<T, ShopError>;
