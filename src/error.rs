//! Application error types for zodiac-admin
//!
//! Each concern gets its own `thiserror` enum. The variants of [`AuthError`]
//! are deliberately fine-grained internally; the HTTP layer collapses them into
//! a handful of fixed responses (see `server::middleware::AuthResponse`).

use thiserror::Error;

/// Authentication-related errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    /// Unknown email, wrong password or no matching static credential
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Stored account exists but is not active
    #[error("Account disabled")]
    AccountDisabled,

    /// Wrong segment count, bad base64url or bad JSON payload
    #[error("Malformed token")]
    MalformedToken,

    /// HMAC over header and payload does not match the signature segment
    #[error("Token signature mismatch")]
    SignatureMismatch,

    /// `exp` claim lies in the past
    #[error("Token expired")]
    ExpiredToken,

    /// Missing or non-bearer authorization header
    #[error("Missing authorization header")]
    MissingAuth,

    /// Rate limited due to too many failed attempts
    #[error("Rate limited: too many failed attempts")]
    RateLimited,

    /// Secret or fallback credentials absent
    #[error("Authentication is not configured: {0}")]
    Configuration(String),

    /// Unexpected failure while authenticating
    #[error("Internal authentication error: {0}")]
    Internal(String),
}

impl AuthError {
    /// True for every reason a presented token can be refused
    pub fn is_token_failure(&self) -> bool {
        matches!(
            self,
            AuthError::MalformedToken | AuthError::SignatureMismatch | AuthError::ExpiredToken
        )
    }

    /// True for every reason a login attempt can be refused on its credentials
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            AuthError::InvalidCredentials | AuthError::AccountDisabled
        )
    }
}

/// Database-related errors
#[derive(Debug, Error)]
pub enum DbError {
    /// SQLite error
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The background connection thread is gone or failed
    #[error("Database connection error: {0}")]
    Connection(String),

    /// Record not found
    #[error("Record not found")]
    NotFound,

    /// Constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(String),
}

impl From<tokio_rusqlite::Error> for DbError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::Rusqlite(e) => DbError::from(e),
            other => DbError::Connection(other.to_string()),
        }
    }
}

/// Login notification errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NotifyError {
    /// Request could not be delivered
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    /// Receiver answered with a non-success status
    #[error("Notification rejected: HTTP {0}")]
    Rejected(u16),
}

/// Application-level error type
///
/// Aggregates the domain-specific error types for start-up and glue code.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication error
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Notification error
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    /// Request carried an unusable value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
