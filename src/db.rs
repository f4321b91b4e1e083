//! Database initialization and helpers shared by the table modules.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Row, Transaction as SqlTransaction, types::Type};
use time::OffsetDateTime;

use crate::{
    Error,
    asset::create_asset_table,
    auth::{create_refresh_token_table, create_user_table},
    transaction::create_transaction_table,
};

/// Create all the tables for the application's domain models.
///
/// Safe to call on a database that has already been initialized.
///
/// # Errors
/// Returns an error if foreign keys could not be enabled or a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_refresh_token_table(&transaction)?;
    create_asset_table(&transaction)?;
    create_transaction_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Acquire the lock on the shared database connection.
///
/// # Errors
/// Returns [Error::DatabaseLockError] if the lock is poisoned.
pub fn lock_connection(
    db_connection: &Arc<Mutex<Connection>>,
) -> Result<MutexGuard<'_, Connection>, Error> {
    db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError
    })
}

/// Convert a date-time to the Unix timestamp stored in the database.
pub fn to_timestamp(date_time: OffsetDateTime) -> i64 {
    date_time.unix_timestamp()
}

/// Read a Unix timestamp column as a UTC date-time.
pub fn get_timestamp(row: &Row, index: usize) -> Result<OffsetDateTime, rusqlite::Error> {
    let seconds: i64 = row.get(index)?;

    OffsetDateTime::from_unix_timestamp(seconds).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Integer, Box::new(error))
    })
}

/// The current time truncated to whole seconds, matching the stored precision.
pub fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();

    now.replace_nanosecond(0).unwrap_or(now)
}
