//! Implements a struct that holds the state of the REST server.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use rusqlite::Connection;
use time::Duration;

use crate::{Error, auth::TokenKeys, db::initialize, timezone::get_local_offset};

/// How long access tokens are valid for unless configured otherwise.
pub const DEFAULT_ACCESS_TOKEN_DURATION: Duration = Duration::minutes(15);
/// How long refresh tokens are valid for unless configured otherwise.
pub const DEFAULT_REFRESH_TOKEN_DURATION: Duration = Duration::days(7);

/// The secrets and lifetimes for access and refresh tokens.
#[derive(Clone)]
pub struct TokenConfig {
    /// The secret used to sign access tokens.
    pub access_secret: String,
    /// The secret used to sign refresh tokens.
    pub refresh_secret: String,
    /// How long an access token is valid for.
    pub access_token_duration: Duration,
    /// How long a refresh token is valid for.
    pub refresh_token_duration: Duration,
}

impl TokenConfig {
    /// Create a config with the default token lifetimes.
    pub fn new(access_secret: &str, refresh_secret: &str) -> Self {
        Self {
            access_secret: access_secret.to_owned(),
            refresh_secret: refresh_secret.to_owned(),
            access_token_duration: DEFAULT_ACCESS_TOKEN_DURATION,
            refresh_token_duration: DEFAULT_REFRESH_TOKEN_DURATION,
        }
    }

    /// Set how long access tokens are valid for.
    pub fn access_token_duration(mut self, duration: Duration) -> Self {
        self.access_token_duration = duration;
        self
    }

    /// Set how long refresh tokens are valid for.
    pub fn refresh_token_duration(mut self, duration: Duration) -> Self {
        self.refresh_token_duration = duration;
        self
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_secret", &"********")
            .field("refresh_secret", &"********")
            .field("access_token_duration", &self.access_token_duration)
            .field("refresh_token_duration", &self.refresh_token_duration)
            .finish()
    }
}

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The keys for signing and verifying access and refresh tokens.
    pub token_keys: Arc<TokenKeys>,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// Used to decide where calendar days and months begin.
    pub local_timezone: String,

    /// The directory uploaded avatars are saved to and served from.
    pub upload_dir: PathBuf,

    /// The bcrypt cost for hashing new passwords.
    pub password_cost: u32,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized or the timezone is not valid.
    pub fn new(
        db_connection: Connection,
        token_config: &TokenConfig,
        local_timezone: &str,
        upload_dir: &Path,
    ) -> Result<Self, Error> {
        if get_local_offset(local_timezone).is_none() {
            return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
        }

        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            token_keys: Arc::new(TokenKeys::new(token_config)),
            local_timezone: local_timezone.to_owned(),
            upload_dir: upload_dir.to_owned(),
            password_cost: crate::PasswordHash::DEFAULT_COST,
        })
    }

    /// Set the bcrypt cost used when registering users.
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }
}
