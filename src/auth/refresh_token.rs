//! The server-side list of refresh tokens that are still allowed to mint access tokens.
//!
//! Each user has at most one active refresh token. Logging in replaces it and
//! logging out removes it, which revokes the token even though its signature
//! remains valid until it expires. Only a SHA-256 digest of the token is stored.

use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::{Error, database_id::UserId, db::to_timestamp};

/// Create the refresh token table.
///
/// # Errors
/// Returns an error if the SQL query failed.
pub fn create_refresh_token_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS refresh_token (
                user_id TEXT PRIMARY KEY,
                token_digest TEXT NOT NULL,
                expires_at INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    Ok(())
}

fn digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Make `token` the only active refresh token for `user_id`.
///
/// # Errors
/// Returns [Error::SqlError] if the token could not be stored.
pub fn store_refresh_token(
    user_id: UserId,
    token: &str,
    expires_at: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO refresh_token (user_id, token_digest, expires_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE SET
            token_digest = excluded.token_digest,
            expires_at = excluded.expires_at",
        params![user_id, digest(token), to_timestamp(expires_at)],
    )?;

    Ok(())
}

/// Whether `token` is the active, unexpired refresh token for `user_id`.
///
/// # Errors
/// Returns [Error::SqlError] if the lookup failed.
pub fn is_refresh_token_active(
    user_id: UserId,
    token: &str,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<bool, Error> {
    let stored: Option<(String, i64)> = connection
        .query_row(
            "SELECT token_digest, expires_at FROM refresh_token WHERE user_id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    Ok(match stored {
        Some((stored_digest, expires_at)) => {
            stored_digest == digest(token) && expires_at > to_timestamp(now)
        }
        None => false,
    })
}

/// Revoke the active refresh token for `user_id`.
///
/// Returns whether there was a token to revoke.
///
/// # Errors
/// Returns [Error::SqlError] if the token could not be deleted.
pub fn revoke_refresh_token(user_id: UserId, connection: &Connection) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "DELETE FROM refresh_token WHERE user_id = ?1",
        params![user_id],
    )?;

    Ok(rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::Duration;

    use crate::{
        auth::{PasswordHash, User, create_user},
        db::{initialize, now_utc},
    };

    use super::{digest, is_refresh_token_active, revoke_refresh_token, store_refresh_token};

    fn get_connection_and_user() -> (Connection, User) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user(
            "foo@bar.baz",
            "Foo",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();

        (connection, user)
    }

    #[test]
    fn digest_is_hex_sha256() {
        assert_eq!(
            digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn stored_token_is_active() {
        let (connection, user) = get_connection_and_user();
        let now = now_utc();

        store_refresh_token(user.id, "token-a", now + Duration::days(7), &connection).unwrap();

        assert_eq!(
            is_refresh_token_active(user.id, "token-a", now, &connection),
            Ok(true)
        );
        assert_eq!(
            is_refresh_token_active(user.id, "token-b", now, &connection),
            Ok(false)
        );
    }

    #[test]
    fn storing_new_token_replaces_old_one() {
        let (connection, user) = get_connection_and_user();
        let now = now_utc();

        store_refresh_token(user.id, "token-a", now + Duration::days(7), &connection).unwrap();
        store_refresh_token(user.id, "token-b", now + Duration::days(7), &connection).unwrap();

        assert_eq!(
            is_refresh_token_active(user.id, "token-a", now, &connection),
            Ok(false)
        );
        assert_eq!(
            is_refresh_token_active(user.id, "token-b", now, &connection),
            Ok(true)
        );
    }

    #[test]
    fn expired_token_is_inactive() {
        let (connection, user) = get_connection_and_user();
        let now = now_utc();

        store_refresh_token(user.id, "token-a", now - Duration::seconds(1), &connection).unwrap();

        assert_eq!(
            is_refresh_token_active(user.id, "token-a", now, &connection),
            Ok(false)
        );
    }

    #[test]
    fn revoked_token_is_inactive() {
        let (connection, user) = get_connection_and_user();
        let now = now_utc();
        store_refresh_token(user.id, "token-a", now + Duration::days(7), &connection).unwrap();

        assert_eq!(revoke_refresh_token(user.id, &connection), Ok(true));

        assert_eq!(
            is_refresh_token_active(user.id, "token-a", now, &connection),
            Ok(false)
        );
        assert_eq!(revoke_refresh_token(user.id, &connection), Ok(false));
    }
}
