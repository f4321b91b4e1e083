//! The route handlers for the statistics endpoints.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    database_id::UserId,
    db::lock_connection,
    extract::QueryParams,
    stats::{
        aggregation::{
            CategoryShare, MonthlyTotals, aggregate_by_month, category_breakdown, month_sequence,
        },
        query::{dated_amounts, sum_by_category},
    },
    timezone::local_today,
    transaction::TransactionType,
    window::{TimeWindow, parse_optional_date},
};

/// How many months are reported when no count is given.
pub const DEFAULT_MONTHS: u32 = 6;
/// The most months that can be reported at once.
pub const MAX_MONTHS: u32 = 24;

/// The state needed by the statistics endpoints.
#[derive(Debug, Clone)]
pub struct StatsState {
    /// The database connection for reading transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for StatsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query parameters for the category breakdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryStatsQuery {
    /// Which type of transaction to break down. Defaults to expenses.
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    /// The first local calendar day to include, as `YYYY-MM-DD`.
    pub start: Option<String>,
    /// The last local calendar day to include, as `YYYY-MM-DD`.
    pub end: Option<String>,
}

/// Totals grouped by category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    /// Which type of transaction was broken down.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The total across all categories.
    pub total: f64,
    /// Each category's total and share, largest first.
    pub details: Vec<CategoryShare>,
}

/// The query parameters for the monthly totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonthlyStatsQuery {
    /// How many months to report, ending with the current month.
    pub months: Option<u32>,
}

/// A route handler that breaks down the user's income or expenses by category.
pub async fn get_category_stats(
    State(state): State<StatsState>,
    Extension(user_id): Extension<UserId>,
    QueryParams(query): QueryParams<CategoryStatsQuery>,
) -> Result<Json<CategoryStats>, Error> {
    let kind = query.kind.unwrap_or(TransactionType::Expense);
    let window = TimeWindow::from_local_dates(
        parse_optional_date(query.start.as_deref())?,
        parse_optional_date(query.end.as_deref())?,
        &state.local_timezone,
    )?;

    let totals = sum_by_category(
        user_id,
        kind,
        window,
        &*lock_connection(&state.db_connection)?,
    )?;
    let (total, details) = category_breakdown(totals);

    Ok(Json(CategoryStats {
        kind,
        total,
        details,
    }))
}

/// A route handler that reports the user's income and expenses for recent months.
pub async fn get_monthly_stats(
    State(state): State<StatsState>,
    Extension(user_id): Extension<UserId>,
    QueryParams(query): QueryParams<MonthlyStatsQuery>,
) -> Result<Json<Vec<MonthlyTotals>>, Error> {
    let count = query.months.unwrap_or(DEFAULT_MONTHS).clamp(1, MAX_MONTHS);
    let today = local_today(&state.local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(state.local_timezone.clone()))?;
    let months = month_sequence(today, count);

    let window = match (months.first(), months.last()) {
        (Some(first), Some(last)) => TimeWindow {
            start: TimeWindow::month(*first, &state.local_timezone)?.start,
            end: TimeWindow::month(*last, &state.local_timezone)?.end,
        },
        _ => TimeWindow::all_time(),
    };

    let entries = dated_amounts(
        user_id,
        window,
        &state.local_timezone,
        &*lock_connection(&state.db_connection)?,
    )?;

    Ok(Json(aggregate_by_month(&entries, &months)))
}
