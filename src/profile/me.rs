//! The signed-in user's profile together with their balance, this month's totals and their assets.

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    asset::{Asset, list_assets},
    auth::{PublicUser, get_user_by_id},
    database_id::UserId,
    db::lock_connection,
    stats::{UserStats, summarize},
};

/// The state needed by the profile endpoints.
#[derive(Debug, Clone)]
pub struct ProfileState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The directory uploaded avatars are saved to.
    pub upload_dir: PathBuf,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            upload_dir: state.upload_dir.clone(),
        }
    }
}

/// The signed-in user's profile, summary figures and assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeResponse {
    /// The user's public details.
    pub user: PublicUser,
    /// The user's balance and the current month's totals.
    pub stats: UserStats,
    /// The user's assets, oldest first.
    pub assets: Vec<Asset>,
}

/// A route handler that returns the signed-in user's profile.
pub async fn get_me(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<MeResponse>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let user = get_user_by_id(user_id, &connection)?;
    let stats = summarize(user_id, &state.local_timezone, &connection)?;
    let assets = list_assets(user_id, &connection)?;

    Ok(Json(MeResponse {
        user: PublicUser::from(&user),
        stats,
        assets,
    }))
}
