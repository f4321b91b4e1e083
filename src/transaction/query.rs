//! Database query helpers for listing transactions.

use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::UserId,
    transaction::{SELECT_TRANSACTION, Transaction, map_transaction_row},
    window::{TimeWindow, parse_optional_date},
};

/// How many transactions are listed when no limit is given.
pub const DEFAULT_LIMIT: u32 = 20;
/// The most transactions that can be listed at once.
pub const MAX_LIMIT: u32 = 500;

/// The query parameters for listing transactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionQuery {
    /// The first local calendar day to include, as `YYYY-MM-DD`.
    pub start: Option<String>,
    /// The last local calendar day to include, as `YYYY-MM-DD`.
    pub end: Option<String>,
    /// The maximum number of transactions to return.
    pub limit: Option<u32>,
}

impl TransactionQuery {
    /// The date window selected by `start` and `end`.
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] for unparsable dates or [Error::InvalidDateRange]
    /// if `start` is after `end`.
    pub fn window(&self, local_timezone: &str) -> Result<TimeWindow, Error> {
        TimeWindow::from_local_dates(
            parse_optional_date(self.start.as_deref())?,
            parse_optional_date(self.end.as_deref())?,
            local_timezone,
        )
    }

    /// The limit clamped to `1..=MAX_LIMIT`.
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// Get the user's transactions in `window`, newest first.
///
/// Transactions on the same date are ordered by when they were recorded, newest first.
///
/// # Errors
/// Returns [Error::SqlError] if the query or row mapping fails.
pub fn list_transactions(
    user_id: UserId,
    window: TimeWindow,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let query = format!(
        "{SELECT_TRANSACTION}
        WHERE t.user_id = ?1
            AND (?2 IS NULL OR t.date >= ?2)
            AND (?3 IS NULL OR t.date < ?3)
        ORDER BY t.date DESC, t.created_at DESC, t.rowid DESC
        LIMIT ?4"
    );

    connection
        .prepare(&query)?
        .query_map(
            params![
                user_id,
                window.start_timestamp(),
                window.end_timestamp(),
                limit
            ],
            map_transaction_row,
        )?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}
