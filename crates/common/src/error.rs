//! Error types for certvault.

use serde::Serialize;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The resource exists but is in the wrong lifecycle state for the operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    // === Server Errors ===
    /// Key generation, signing, parsing or envelope encryption failed.
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the error code handed to callers.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Crypto(_) => "CRYPTO_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Crypto(_) | Self::Database(_) | Self::Config(_) | Self::Internal(_)
        )
    }

    /// Reject caller input that a parsing library refused. The library's own
    /// message is logged and never returned.
    #[must_use]
    pub fn rejected(message: &str, err: impl std::fmt::Display) -> Self {
        tracing::debug!(error = %err, "{message}");
        Self::BadRequest(message.to_string())
    }

    /// A cryptographic library failure. The library's own message is logged
    /// and never returned.
    #[must_use]
    pub fn crypto_failure(message: &str, err: impl std::fmt::Display) -> Self {
        tracing::warn!(error = %err, "{message}");
        Self::Crypto(message.to_string())
    }

    /// Message shown to callers. Server errors are reduced to a fixed text per kind.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Crypto(_) => "Cryptographic operation failed".to_string(),
            Self::Database(_) => "Database operation failed".to_string(),
            Self::Config(_) => "Service is misconfigured".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Convert into the serializable body returned to callers, logging server errors.
    #[must_use]
    pub fn into_body(self) -> ErrorBody {
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        ErrorBody {
            code,
            message: self.public_message(),
        }
    }
}

/// Error payload exposed to the outer surface.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Stable error kind, see [`AppError::error_code`].
    pub code: &'static str,
    /// Human-readable message, free of library internals.
    pub message: String,
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<openssl::error::ErrorStack> for AppError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        Self::crypto_failure("X.509 operation failed", err)
    }
}

impl From<rcgen::Error> for AppError {
    fn from(err: rcgen::Error) -> Self {
        Self::crypto_failure("CRL generation failed", err)
    }
}

impl From<ssh_key::Error> for AppError {
    fn from(err: ssh_key::Error) -> Self {
        Self::crypto_failure("SSH operation failed", err)
    }
}
