//! The endpoint for logging out, which revokes the user's refresh token.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, MessageResponse, auth::refresh_token::revoke_refresh_token,
    database_id::UserId, db::lock_connection,
};

/// The state needed to log out.
#[derive(Debug, Clone)]
pub struct LogOutState {
    /// The database connection for revoking refresh tokens.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LogOutState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Log the user out by revoking their refresh token.
///
/// The access token stays valid until it expires, the client is expected to discard it.
pub async fn post_log_out(
    State(state): State<LogOutState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<MessageResponse>, Error> {
    let was_revoked = revoke_refresh_token(user_id, &*lock_connection(&state.db_connection)?)?;

    if !was_revoked {
        tracing::debug!("User {user_id} logged out without an active refresh token");
    }

    Ok(Json(MessageResponse::new("Logged out")))
}
