//! Client error types.

use thiserror::Error;

/// Result type alias for the client module.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur while talking to the API.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The request could not be sent or the response could not be read.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    ///
    /// `message` is the server's `error` field, or the raw body if it had none.
    #[error("server returned {status}: {message}")]
    Api {
        /// The HTTP status code.
        status: u16,
        /// The error message from the server.
        message: String,
    },

    /// The access token was rejected and could not be refreshed.
    ///
    /// The stored tokens have been cleared, so the user must log in again.
    #[error("your session has expired, please log in again")]
    SessionExpired,

    /// An authenticated request was made without any stored tokens.
    #[error("not logged in")]
    NotLoggedIn,

    /// The token file could not be read or written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The token file does not contain valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
