//! SDK error types

use thiserror::Error;

/// Errors raised by the auth and document store back ends
#[derive(Error, Debug)]
pub enum SdkError {
    /// Project configuration is incomplete
    #[error("Configuration error: {0}")]
    Config(String),

    /// Wrong email or password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Sign up with an email that already has an account
    #[error("Email already registered: {0}")]
    EmailExists(String),

    /// Missing, expired or unknown session token
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Password rejected by the provider
    #[error("Weak password: {0}")]
    WeakPassword(String),

    /// Document does not exist
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// Remote service answered with an error
    #[error("Remote error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// Remote service could not be reached
    #[error("Service unavailable")]
    Unavailable,

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// HTTP transport failed
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Local database failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Password hashing failed
    #[error("Hashing error: {0}")]
    Hash(String),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),

    /// Blocking worker panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for SdkError {
    fn from(err: tokio::task::JoinError) -> Self {
        SdkError::Task(err.to_string())
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        SdkError::Serialization(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for SdkError {
    fn from(err: bcrypt::BcryptError) -> Self {
        SdkError::Hash(err.to_string())
    }
}

impl SdkError {
    pub(crate) fn not_found(collection: &str, id: &str) -> Self {
        SdkError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    /// Map a reqwest failure the way the REST clients report it
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SdkError::Timeout
        } else if err.is_connect() {
            SdkError::Unavailable
        } else {
            SdkError::Request(err)
        }
    }
}
