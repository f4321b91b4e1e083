//! The built-in category catalog.
//!
//! Transactions store a free-form category ID and name, so users are not limited
//! to this list. The catalog supplies the default names and the icons and colours
//! shown by clients.

use axum::Json;
use serde::Serialize;

use crate::transaction::TransactionType;

/// A built-in category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    /// The stable ID stored on transactions, e.g. "food".
    pub id: &'static str,
    /// The display name.
    pub name: &'static str,
    /// An emoji to show next to the name.
    pub icon: &'static str,
    /// A CSS hex colour.
    pub color: &'static str,
    /// Whether the category is for income or expenses.
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

const fn expense(
    id: &'static str,
    name: &'static str,
    icon: &'static str,
    color: &'static str,
) -> Category {
    Category {
        id,
        name,
        icon,
        color,
        kind: TransactionType::Expense,
    }
}

const fn income(
    id: &'static str,
    name: &'static str,
    icon: &'static str,
    color: &'static str,
) -> Category {
    Category {
        id,
        name,
        icon,
        color,
        kind: TransactionType::Income,
    }
}

/// The built-in expense categories.
pub static EXPENSE_CATEGORIES: [Category; 9] = [
    expense("food", "Food", "🍜", "#FF9500"),
    expense("shopping", "Shopping", "🛍️", "#FF2D55"),
    expense("transport", "Transport", "🚕", "#007AFF"),
    expense("daily", "Daily", "🏠", "#5856D6"),
    expense("entertainment", "Entertainment", "🎮", "#AF52DE"),
    expense("medical", "Medical", "🏥", "#FF3B30"),
    expense("education", "Education", "📚", "#5AC8FA"),
    expense("social", "Social", "🥂", "#FFCC00"),
    expense("other-expense", "Other", "💸", "#8E8E93"),
];

/// The built-in income categories.
pub static INCOME_CATEGORIES: [Category; 6] = [
    income("salary", "Salary", "💰", "#34C759"),
    income("part-time", "Part-time", "🔨", "#00C7BE"),
    income("investment", "Investment", "📈", "#30B0C7"),
    income("gift", "Gift", "🧧", "#FF3B30"),
    income("bonus", "Bonus", "💎", "#AF52DE"),
    income("other-income", "Other", "✨", "#8E8E93"),
];

/// Look up a built-in category by ID.
pub fn find_category(id: &str) -> Option<&'static Category> {
    EXPENSE_CATEGORIES
        .iter()
        .chain(INCOME_CATEGORIES.iter())
        .find(|category| category.id == id)
}

/// The catalog grouped by transaction type.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryCatalog {
    /// Categories for expenses.
    pub expense: &'static [Category],
    /// Categories for income.
    pub income: &'static [Category],
}

/// A route handler that lists the built-in categories.
pub async fn get_categories() -> Json<CategoryCatalog> {
    Json(CategoryCatalog {
        expense: &EXPENSE_CATEGORIES,
        income: &INCOME_CATEGORIES,
    })
}
