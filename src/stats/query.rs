//! Database queries that sum transaction amounts for the statistics endpoints.

use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    database_id::UserId,
    db::get_timestamp,
    stats::aggregation::CategoryTotal,
    timezone::local_date_of,
    transaction::TransactionType,
    window::TimeWindow,
};

/// The summary figures shown on the user's profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    /// All-time income minus all-time expenses.
    pub balance: f64,
    /// Income in the current local calendar month.
    pub monthly_income: f64,
    /// Expenses in the current local calendar month.
    pub monthly_expense: f64,
}

/// Sum the user's transactions of type `kind` in `window`, grouped by category.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn sum_by_category(
    user_id: UserId,
    kind: TransactionType,
    window: TimeWindow,
    connection: &Connection,
) -> Result<Vec<CategoryTotal>, Error> {
    connection
        .prepare(
            "SELECT category_id, category_name, SUM(amount) FROM \"transaction\"
            WHERE user_id = ?1 AND kind = ?2
                AND (?3 IS NULL OR date >= ?3)
                AND (?4 IS NULL OR date < ?4)
            GROUP BY category_id, category_name",
        )?
        .query_map(
            params![
                user_id,
                kind,
                window.start_timestamp(),
                window.end_timestamp()
            ],
            |row| {
                Ok(CategoryTotal {
                    category_id: row.get(0)?,
                    category_name: row.get(1)?,
                    amount: row.get(2)?,
                })
            },
        )?
        .map(|total| total.map_err(Error::from))
        .collect()
}

/// Sum the user's transactions of type `kind` in `window`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub fn sum_by_type(
    user_id: UserId,
    kind: TransactionType,
    window: TimeWindow,
    connection: &Connection,
) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM \"transaction\"
            WHERE user_id = ?1 AND kind = ?2
                AND (?3 IS NULL OR date >= ?3)
                AND (?4 IS NULL OR date < ?4)",
            params![
                user_id,
                kind,
                window.start_timestamp(),
                window.end_timestamp()
            ],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// The local date, type and amount of each of the user's transactions in `window`.
///
/// # Errors
/// Returns [Error::SqlError] if the query fails, or [Error::InvalidTimezoneError]
/// if `local_timezone` is not valid.
pub fn dated_amounts(
    user_id: UserId,
    window: TimeWindow,
    local_timezone: &str,
    connection: &Connection,
) -> Result<Vec<(Date, TransactionType, f64)>, Error> {
    let rows: Vec<(OffsetDateTime, TransactionType, f64)> = connection
        .prepare(
            "SELECT date, kind, amount FROM \"transaction\"
            WHERE user_id = ?1
                AND (?2 IS NULL OR date >= ?2)
                AND (?3 IS NULL OR date < ?3)",
        )?
        .query_map(
            params![user_id, window.start_timestamp(), window.end_timestamp()],
            |row| Ok((get_timestamp(row, 0)?, row.get(1)?, row.get(2)?)),
        )?
        .collect::<Result<_, _>>()?;

    rows.into_iter()
        .map(|(instant, kind, amount)| {
            local_date_of(instant, local_timezone)
                .map(|date| (date, kind, amount))
                .ok_or_else(|| Error::InvalidTimezoneError(local_timezone.to_owned()))
        })
        .collect()
}

/// Compute the user's balance and the current month's income and expenses.
///
/// # Errors
/// Returns [Error::SqlError] if a query fails, or [Error::InvalidTimezoneError]
/// if `local_timezone` is not valid.
pub fn summarize(
    user_id: UserId,
    local_timezone: &str,
    connection: &Connection,
) -> Result<UserStats, Error> {
    let all_time = TimeWindow::all_time();
    let this_month = TimeWindow::current_month(local_timezone)?;

    let total_income = sum_by_type(user_id, TransactionType::Income, all_time, connection)?;
    let total_expense = sum_by_type(user_id, TransactionType::Expense, all_time, connection)?;

    Ok(UserStats {
        balance: total_income - total_expense,
        monthly_income: sum_by_type(user_id, TransactionType::Income, this_month, connection)?,
        monthly_expense: sum_by_type(user_id, TransactionType::Expense, this_month, connection)?,
    })
}
