//! The endpoint for exchanging a refresh token for a new access token.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{TokenKeys, refresh_token::is_refresh_token_active},
    db::{lock_connection, now_utc},
};

/// The state needed to refresh an access token.
#[derive(Debug, Clone)]
pub struct RefreshState {
    /// The database connection for checking the refresh token has not been revoked.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys for verifying refresh tokens and signing access tokens.
    pub token_keys: Arc<TokenKeys>,
}

impl FromRef<AppState> for RefreshState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            token_keys: state.token_keys.clone(),
        }
    }
}

/// The body of a refresh request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshForm {
    /// The refresh token issued at log-in.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// A new access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// The short-lived token to send as `Authorization: Bearer <token>`.
    pub access_token: String,
}

/// Issue a new access token for a valid, unrevoked refresh token.
///
/// # Errors
///
/// - [Error::MissingRefreshToken] (401) if no token was sent, including when
///   the body is missing or is not JSON.
/// - [Error::InvalidRefreshToken] (403) if the token does not verify.
/// - [Error::RevokedRefreshToken] (403) if the user logged out or logged in elsewhere.
pub async fn refresh_access_token(
    State(state): State<RefreshState>,
    body: Result<Json<RefreshForm>, JsonRejection>,
) -> Result<Json<RefreshResponse>, Error> {
    let form = match body {
        Ok(Json(form)) => form,
        Err(rejection) => {
            tracing::debug!("Could not read refresh request body: {rejection}");
            RefreshForm::default()
        }
    };

    let refresh_token = match form.refresh_token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => token,
        _ => return Err(Error::MissingRefreshToken),
    };

    let claims = state.token_keys.verify_refresh_token(refresh_token)?;

    let is_active = is_refresh_token_active(
        claims.sub,
        refresh_token,
        now_utc(),
        &*lock_connection(&state.db_connection)?,
    )?;

    if !is_active {
        tracing::debug!("Rejected revoked refresh token for user {}", claims.sub);
        return Err(Error::RevokedRefreshToken);
    }

    let access_token = state.token_keys.issue_access_token(claims.sub)?;

    Ok(Json(RefreshResponse {
        access_token: access_token.token,
    }))
}
