//! Expense Tracker is a personal finance tracker for recording income and
//! expenses against categories and asset accounts.
//!
//! This library provides a JSON REST API secured with short-lived access
//! tokens and revocable refresh tokens, and a typed client for that API which
//! refreshes expired access tokens transparently.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod asset;
mod auth;
mod category;
pub mod client;
mod database_id;
mod db;
pub mod endpoints;
mod extract;
mod logging;
mod not_found;
mod profile;
mod routing;
mod stats;
mod timezone;
mod transaction;
mod window;

#[cfg(test)]
mod test_utils;

pub use app_state::{AppState, TokenConfig};
pub use asset::{Asset, AssetForm, AssetKind, create_asset};
pub use auth::{
    LogInForm, LogInResponse, PasswordHash, PublicUser, RefreshResponse, RegisterForm,
    RegisterResponse, User, ValidatedPassword, create_user,
};
pub use category::{Category, EXPENSE_CATEGORIES, INCOME_CATEGORIES};
pub use database_id::{AssetId, TransactionId, UserId};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use profile::{AvatarResponse, MeResponse, ProfileForm};
pub use routing::{MessageResponse, build_router};
pub use stats::{
    CategoryShare, CategoryStats, CategoryStatsQuery, MonthlyStatsQuery, MonthlyTotals, UserStats,
};
pub use transaction::{
    NewTransaction, Transaction, TransactionForm, TransactionQuery, TransactionType,
    create_transaction,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The email and password combination did not match a registered user.
    ///
    /// Unknown emails and wrong passwords share this variant so that clients
    /// cannot probe which emails are registered.
    #[error("incorrect email or password")]
    InvalidCredentials,

    /// The string given as an email address is not a valid email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The email address is already used by another user.
    #[error("the email address is already in use")]
    DuplicateEmail,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The request did not include a bearer token.
    #[error("no access token was provided")]
    MissingToken,

    /// The access token could not be verified, has expired, or is not an access token.
    #[error("the access token is invalid or has expired")]
    InvalidToken,

    /// A refresh was requested without a refresh token.
    #[error("no refresh token was provided")]
    MissingRefreshToken,

    /// The refresh token could not be verified, has expired, or is not a refresh token.
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    /// The refresh token is well formed but has been revoked or replaced.
    #[error("the refresh token has expired or been revoked")]
    RevokedRefreshToken,

    /// A token could not be signed.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// Transaction amounts must be finite and greater than zero.
    #[error("{0} is not a valid amount, amounts must be greater than zero")]
    InvalidAmount(f64),

    /// Asset balances must be finite numbers.
    #[error("{0} is not a valid balance")]
    InvalidBalance(f64),

    /// The category ID is blank, or it is not a built-in category and no name was given.
    #[error("invalid category \"{0}\"")]
    InvalidCategory(String),

    /// The asset ID does not refer to one of the user's assets.
    #[error("the asset {0} does not exist")]
    InvalidAsset(AssetId),

    /// A date could not be parsed.
    #[error("could not parse the date \"{0}\"")]
    InvalidDate(String),

    /// The start of a date range is after its end.
    #[error("the start date must not be after the end date")]
    InvalidDateRange,

    /// An empty string was used as an asset name.
    #[error("asset name cannot be empty")]
    EmptyAssetName,

    /// An empty string was used as a nickname.
    #[error("nickname cannot be empty")]
    EmptyNickname,

    /// The uploaded avatar is not a supported image type.
    #[error("the uploaded file must be a PNG, JPEG, GIF or WebP image")]
    NotAnImage,

    /// The multipart form could not be read.
    #[error("could not parse multipart form: {0}")]
    MultipartError(String),

    /// The request body is larger than the route accepts.
    #[error("the request body is too large")]
    PayloadTooLarge,

    /// The request body, query string or path could not be read into the
    /// expected shape.
    #[error("{message}")]
    InvalidRequest {
        /// The status axum chose for the rejection.
        status: StatusCode,
        /// What was wrong with the request.
        message: String,
    },

    /// An uploaded file could not be saved.
    #[error("could not save file: {0}")]
    FileError(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidCredentials
            | Error::InvalidEmail(_)
            | Error::DuplicateEmail
            | Error::TooWeak(_)
            | Error::InvalidAmount(_)
            | Error::InvalidBalance(_)
            | Error::InvalidCategory(_)
            | Error::InvalidAsset(_)
            | Error::InvalidDate(_)
            | Error::InvalidDateRange
            | Error::EmptyAssetName
            | Error::EmptyNickname
            | Error::NotAnImage
            | Error::MultipartError(_) => StatusCode::BAD_REQUEST,
            Error::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Error::InvalidRequest { status, .. } => *status,
            Error::MissingToken | Error::InvalidToken | Error::MissingRefreshToken => {
                StatusCode::UNAUTHORIZED
            }
            Error::InvalidRefreshToken | Error::RevokedRefreshToken => StatusCode::FORBIDDEN,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::FileError(_)
            | Error::InvalidTimezoneError(_)
            | Error::DatabaseLockError
            | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Error::InvalidCredentials => "Incorrect email or password.".to_owned(),
            Error::DuplicateEmail => {
                "Registration failed, the email address may already be in use.".to_owned()
            }
            Error::NotFound => "Not found".to_owned(),
            Error::InvalidTimezoneError(timezone) => format!(
                "Could not get local timezone \"{timezone}\". Check your server settings and \
                ensure the timezone has been set to valid, canonical timezone string"
            ),
            // Internal details are for the server logs only.
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::FileError(_)
            | Error::DatabaseLockError
            | Error::SqlError(_) => {
                "An unexpected error occurred, check the server logs for more details.".to_owned()
            }
            error => {
                let message = error.to_string();
                let mut chars = message.chars();

                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => message,
                }
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
        }

        let body = Json(json!({ "error": self.client_message() }));
        let mut response = (status, body).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}
