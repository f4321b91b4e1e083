//! The endpoint for exchanging an email and password for a token pair.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{
        PublicUser, TokenKeys, get_user_by_email, normalize_email,
        refresh_token::store_refresh_token,
    },
    db::lock_connection,
    extract::JsonBody,
};

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The database connection for looking up users and storing refresh tokens.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The keys for signing the issued tokens.
    pub token_keys: Arc<TokenKeys>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            token_keys: state.token_keys.clone(),
        }
    }
}

/// The credentials entered by the user at log-in.
///
/// The password is stored as a plain string. There is no need for validation here since
/// it will be compared against the password hash in the database.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInForm {
    /// Email entered during log-in.
    pub email: String,
    /// Password entered during log-in.
    pub password: String,
}

/// The tokens and user returned by a successful log-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogInResponse {
    /// The short-lived token to send as `Authorization: Bearer <token>`.
    pub access_token: String,
    /// The long-lived token for getting new access tokens.
    pub refresh_token: String,
    /// Always "bearer".
    pub token_type: String,
    /// The user that logged in.
    pub user: PublicUser,
}

/// Handler for log-in requests via the POST method.
///
/// On success, a new refresh token replaces any refresh token the user already had.
///
/// # Errors
///
/// Returns [Error::InvalidCredentials] if the email is not registered or the
/// password is wrong, so clients cannot tell the two apart.
pub async fn post_log_in(
    State(state): State<LoginState>,
    JsonBody(form): JsonBody<LogInForm>,
) -> Result<Json<LogInResponse>, Error> {
    let email = normalize_email(&form.email).map_err(|_| Error::InvalidCredentials)?;

    let user = match get_user_by_email(&email, &*lock_connection(&state.db_connection)?) {
        Ok(user) => user,
        Err(Error::NotFound) => return Err(Error::InvalidCredentials),
        Err(error) => return Err(error),
    };

    let is_password_valid = user.password_hash.verify(&form.password).map_err(|error| {
        tracing::error!("Unhandled error while verifying credentials: {error}");
        Error::HashingError(error.to_string())
    })?;

    if !is_password_valid {
        tracing::debug!("Wrong password for user {}", user.id);
        return Err(Error::InvalidCredentials);
    }

    let access_token = state.token_keys.issue_access_token(user.id)?;
    let refresh_token = state.token_keys.issue_refresh_token(user.id)?;

    store_refresh_token(
        user.id,
        &refresh_token.token,
        refresh_token.expires_at,
        &*lock_connection(&state.db_connection)?,
    )?;

    tracing::info!("User {} logged in", user.id);

    Ok(Json(LogInResponse {
        access_token: access_token.token,
        refresh_token: refresh_token.token,
        token_type: "bearer".to_owned(),
        user: PublicUser::from(&user),
    }))
}
