//! Code for creating the user table and fetching users from the database.

use email_address::EmailAddress;
use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::PasswordHash,
    database_id::UserId,
    db::{get_timestamp, now_utc, to_timestamp},
};

/// The nickname given to users who register without one.
pub const DEFAULT_NICKNAME: &str = "New user";

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The user's email address, trimmed and lower-cased.
    pub email: String,
    /// The name shown in the app.
    pub nickname: String,
    /// The URL path of the user's avatar image.
    pub avatar: Option<String>,
    /// The user's password hash.
    pub password_hash: PasswordHash,
    /// When the user registered.
    pub created_at: OffsetDateTime,
    /// When the user's profile last changed.
    pub updated_at: OffsetDateTime,
}

/// The parts of a user that are safe to send to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicUser {
    /// The user's ID.
    pub id: UserId,
    /// The user's email address.
    pub email: String,
    /// The name shown in the app.
    pub nickname: String,
    /// The URL path of the user's avatar image.
    pub avatar: Option<String>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            nickname: user.nickname.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

/// Trim and lower-case an email address, checking that it is valid.
///
/// # Errors
/// Returns [Error::InvalidEmail] if the address is not a valid email address.
pub fn normalize_email(raw_email: &str) -> Result<String, Error> {
    let email = raw_email.trim().to_lowercase();

    if EmailAddress::is_valid(&email) {
        Ok(email)
    } else {
        Err(Error::InvalidEmail(raw_email.to_owned()))
    }
}

/// Trim a nickname, falling back to [DEFAULT_NICKNAME] when it is missing or blank.
pub fn nickname_or_default(nickname: Option<&str>) -> String {
    match nickname.map(str::trim) {
        Some(nickname) if !nickname.is_empty() => nickname.to_owned(),
        _ => DEFAULT_NICKNAME.to_owned(),
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                nickname TEXT NOT NULL,
                avatar TEXT,
                password TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// `email` should already be normalized with [normalize_email].
///
/// # Errors
///
/// Returns [Error::DuplicateEmail] if the email is taken, or [Error::SqlError]
/// if another SQL related error occurred.
pub fn create_user(
    email: &str,
    nickname: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let user = User {
        id: UserId::new(),
        email: email.to_owned(),
        nickname: nickname.to_owned(),
        avatar: None,
        password_hash,
        created_at: now_utc(),
        updated_at: now_utc(),
    };

    connection.execute(
        "INSERT INTO user (id, email, nickname, avatar, password, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user.id,
            user.email,
            user.nickname,
            user.avatar,
            user.password_hash.as_ref(),
            to_timestamp(user.created_at),
            to_timestamp(user.updated_at),
        ],
    )?;

    Ok(user)
}

const SELECT_USER: &str =
    "SELECT id, email, nickname, avatar, password, created_at, updated_at FROM user";

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(4)?;

    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        nickname: row.get(2)?,
        avatar: row.get(3)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        created_at: get_timestamp(row, 5)?,
        updated_at: get_timestamp(row, 6)?,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("{SELECT_USER} WHERE id = :id"))?
        .query_row(&[(":id", &user_id)], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user registered with `email`, which should already be normalized.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has the email address.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("{SELECT_USER} WHERE email = :email"))?
        .query_row(&[(":email", &email)], map_user_row)
        .map_err(|error| error.into())
}

/// Replace a user's nickname and avatar.
///
/// # Errors
///
/// Returns [Error::NotFound] if the user does not exist.
pub fn update_profile(
    user_id: UserId,
    nickname: &str,
    avatar: Option<&str>,
    connection: &Connection,
) -> Result<User, Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET nickname = ?1, avatar = ?2, updated_at = ?3 WHERE id = ?4",
        params![nickname, avatar, to_timestamp(now_utc()), user_id],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_user_by_id(user_id, connection)
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
#[cfg(test)]
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(|error| error.into())
}
