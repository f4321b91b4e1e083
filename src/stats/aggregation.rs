//! Transaction data aggregation for the statistics endpoints.
//!
//! Groups totals by category with their share of the overall total, and buckets
//! transactions into calendar months.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    transaction::TransactionType,
    window::{first_of_month, previous_month},
};

/// The summed amount for one category, straight from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    /// The category ID.
    pub category_id: String,
    /// The category name.
    pub category_name: String,
    /// The sum of the amounts in this category.
    pub amount: f64,
}

/// One category's share of the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    /// The category ID.
    pub category_id: String,
    /// The category name.
    pub category_name: String,
    /// The sum of the amounts in this category.
    pub amount: f64,
    /// The share of the total as a whole percentage.
    pub percentage: i64,
}

/// Totals for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotals {
    /// The month as `YYYY-MM`.
    pub month: String,
    /// The total income in the month.
    pub income: f64,
    /// The total expenses in the month.
    pub expense: f64,
    /// Income minus expenses.
    pub net: f64,
}

/// `amount` as a whole percentage of `total`, rounded half away from zero.
///
/// Returns 0 when `total` is not positive.
pub fn percentage(amount: f64, total: f64) -> i64 {
    if total <= 0.0 || !total.is_finite() {
        return 0;
    }

    (amount / total * 100.0).round() as i64
}

/// Compute each category's share of the combined total.
///
/// # Returns
/// The combined total, and the shares ordered by amount (largest first) and then category ID.
pub fn category_breakdown(totals: Vec<CategoryTotal>) -> (f64, Vec<CategoryShare>) {
    let total: f64 = totals.iter().map(|category| category.amount).sum();

    let mut shares: Vec<CategoryShare> = totals
        .into_iter()
        .map(|category| CategoryShare {
            percentage: percentage(category.amount, total),
            category_id: category.category_id,
            category_name: category.category_name,
            amount: category.amount,
        })
        .collect();

    shares.sort_by(|a, b| {
        b.amount
            .total_cmp(&a.amount)
            .then_with(|| a.category_id.cmp(&b.category_id))
    });

    (total, shares)
}

/// The first days of the `count` months ending with the month of `current`, oldest first.
pub fn month_sequence(current: Date, count: u32) -> Vec<Date> {
    let mut months = Vec::with_capacity(count as usize);
    let mut month = first_of_month(current);

    for _ in 0..count {
        months.push(month);
        month = previous_month(month);
    }

    months.reverse();
    months
}

/// Format a date as `YYYY-MM`.
pub fn format_month(date: Date) -> String {
    format!("{:04}-{:02}", date.year(), u8::from(date.month()))
}

/// Sum income and expenses for each month in `months`.
///
/// # Arguments
/// * `entries` - The local date, type and amount of each transaction
/// * `months` - The first day of each month to report, in the order to report them
///
/// Entries outside `months` are ignored. Months without entries report zeros.
pub fn aggregate_by_month(
    entries: &[(Date, TransactionType, f64)],
    months: &[Date],
) -> Vec<MonthlyTotals> {
    let mut totals: HashMap<Date, (f64, f64)> = HashMap::new();

    for (date, kind, amount) in entries {
        let month_totals = totals.entry(first_of_month(*date)).or_insert((0.0, 0.0));

        match kind {
            TransactionType::Income => month_totals.0 += amount,
            TransactionType::Expense => month_totals.1 += amount,
        }
    }

    months
        .iter()
        .map(|month| {
            let (income, expense) = totals.get(month).copied().unwrap_or((0.0, 0.0));

            MonthlyTotals {
                month: format_month(*month),
                income,
                expense,
                net: income - expense,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::transaction::TransactionType;

    use super::{
        CategoryTotal, aggregate_by_month, category_breakdown, format_month, month_sequence,
        percentage,
    };

    fn total(id: &str, amount: f64) -> CategoryTotal {
        CategoryTotal {
            category_id: id.to_owned(),
            category_name: id.to_uppercase(),
            amount,
        }
    }

    #[test]
    fn percentage_rounds_to_whole_number() {
        assert_eq!(percentage(1.0, 3.0), 33);
        assert_eq!(percentage(2.0, 3.0), 67);
        assert_eq!(percentage(1.0, 8.0), 13);
        assert_eq!(percentage(5.0, 5.0), 100);
    }

    #[test]
    fn percentage_of_zero_total_is_zero() {
        assert_eq!(percentage(0.0, 0.0), 0);
    }

    #[test]
    fn breakdown_sorts_by_amount_then_id() {
        let (total_amount, shares) = category_breakdown(vec![
            total("transport", 45.0),
            total("shopping", 299.0),
            total("food", 45.0),
            total("daily", 11.0),
        ]);

        assert_eq!(total_amount, 400.0);
        let ids: Vec<_> = shares.iter().map(|share| share.category_id.as_str()).collect();
        assert_eq!(ids, vec!["shopping", "food", "transport", "daily"]);
        let percentages: Vec<_> = shares.iter().map(|share| share.percentage).collect();
        assert_eq!(percentages, vec![75, 11, 11, 3]);
    }

    #[test]
    fn breakdown_of_nothing_is_empty() {
        let (total_amount, shares) = category_breakdown(vec![]);

        assert_eq!(total_amount, 0.0);
        assert!(shares.is_empty());
    }

    #[test]
    fn month_sequence_crosses_year_boundary() {
        assert_eq!(
            month_sequence(date!(2026 - 02 - 17), 4),
            vec![
                date!(2025 - 11 - 01),
                date!(2025 - 12 - 01),
                date!(2026 - 01 - 01),
                date!(2026 - 02 - 01),
            ]
        );
    }

    #[test]
    fn month_sequence_of_one_is_current_month() {
        assert_eq!(
            month_sequence(date!(2026 - 01 - 31), 1),
            vec![date!(2026 - 01 - 01)]
        );
    }

    #[test]
    fn formats_month() {
        assert_eq!(format_month(date!(2026 - 01 - 01)), "2026-01");
        assert_eq!(format_month(date!(2025 - 12 - 01)), "2025-12");
    }

    #[test]
    fn aggregates_income_and_expense_per_month() {
        let months = month_sequence(date!(2026 - 01 - 19), 3);
        let entries = vec![
            (date!(2026 - 01 - 19), TransactionType::Expense, 32.0),
            (date!(2026 - 01 - 15), TransactionType::Income, 6800.0),
            (date!(2026 - 01 - 18), TransactionType::Expense, 299.0),
            (date!(2025 - 11 - 30), TransactionType::Income, 100.0),
            (date!(2025 - 06 - 01), TransactionType::Income, 1.0),
        ];

        let totals = aggregate_by_month(&entries, &months);

        assert_eq!(totals.len(), 3);
        assert_eq!(totals[0].month, "2025-11");
        assert_eq!(totals[0].income, 100.0);
        assert_eq!(totals[1].month, "2025-12");
        assert_eq!(totals[1].income, 0.0);
        assert_eq!(totals[1].expense, 0.0);
        assert_eq!(totals[2].month, "2026-01");
        assert_eq!(totals[2].income, 6800.0);
        assert_eq!(totals[2].expense, 331.0);
        assert_eq!(totals[2].net, 6469.0);
    }
}
