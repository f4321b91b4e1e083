//! Income and expense statistics: category breakdowns, monthly totals and the
//! profile summary.

mod aggregation;
mod endpoints;
mod query;

pub use aggregation::{CategoryShare, MonthlyTotals};
pub use endpoints::{
    CategoryStats, CategoryStatsQuery, MonthlyStatsQuery,
    get_category_stats, get_monthly_stats,
};
pub use query::{UserStats, summarize};
