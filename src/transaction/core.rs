//! Defines the core data models and database queries for transactions.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    asset::{Asset, asset_belongs_to, map_asset_row_with_offset},
    database_id::{AssetId, TransactionId, UserId},
    db::{get_timestamp, now_utc, to_timestamp},
};

// ============================================================================
// MODELS
// ============================================================================

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The lowercase name used in JSON and the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserId,
    /// How much money was earned or spent, always greater than zero.
    pub amount: f64,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The category ID, e.g. "food".
    pub category_id: String,
    /// The category name shown to the user.
    pub category_name: String,
    /// When the transaction happened.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    /// A free text note.
    pub note: Option<String>,
    /// The asset the money came from or went to.
    pub asset_id: Option<AssetId>,
    /// The linked asset, if any.
    pub asset: Option<Asset>,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A validated transaction ready to be stored.
///
/// Build one from a [crate::TransactionForm].
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    /// How much money was earned or spent, greater than zero.
    pub amount: f64,
    /// Whether the money was earned or spent.
    pub kind: TransactionType,
    /// The category ID.
    pub category_id: String,
    /// The category name.
    pub category_name: String,
    /// When the transaction happened.
    pub date: OffsetDateTime,
    /// A free text note.
    pub note: Option<String>,
    /// The asset the money came from or went to.
    pub asset_id: Option<AssetId>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create the transaction table.
///
/// # Errors
/// Returns an error if the SQL query failed.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            amount REAL NOT NULL,
            kind TEXT NOT NULL,
            category_id TEXT NOT NULL,
            category_name TEXT NOT NULL,
            date INTEGER NOT NULL,
            note TEXT,
            asset_id TEXT,
            created_at INTEGER NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(asset_id) REFERENCES asset(id) ON UPDATE CASCADE ON DELETE SET NULL
        )",
        (),
    )?;

    // Speeds up the date range and per-user queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date)",
        (),
    )?;

    Ok(())
}

/// Selects transactions with the linked asset joined on.
///
/// The asset columns start at [ASSET_OFFSET]. Callers add their own `WHERE` clause
/// using the `t` alias.
pub const SELECT_TRANSACTION: &str = "SELECT
        t.id, t.user_id, t.amount, t.kind, t.category_id, t.category_name, t.date, t.note,
        t.created_at,
        a.id, a.name, a.kind, a.balance, a.icon, a.color, a.created_at
    FROM \"transaction\" t
    LEFT JOIN asset a ON a.id = t.asset_id";

const ASSET_OFFSET: usize = 9;

/// Map a row selected with [SELECT_TRANSACTION] to a transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let asset_id: Option<AssetId> = row.get(ASSET_OFFSET)?;
    let asset = match asset_id {
        Some(_) => Some(map_asset_row_with_offset(row, ASSET_OFFSET)?),
        None => None,
    };

    Ok(Transaction {
        id: row.get(0)?,
        user_id: row.get(1)?,
        amount: row.get(2)?,
        kind: row.get(3)?,
        category_id: row.get(4)?,
        category_name: row.get(5)?,
        date: get_timestamp(row, 6)?,
        note: row.get(7)?,
        asset_id,
        asset,
        created_at: get_timestamp(row, 8)?,
    })
}

fn check_asset(
    asset_id: Option<AssetId>,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    match asset_id {
        Some(asset_id) if !asset_belongs_to(asset_id, user_id, connection)? => {
            Err(Error::InvalidAsset(asset_id))
        }
        _ => Ok(()),
    }
}

/// Create a new transaction for `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAsset] if the asset ID does not refer to one of the user's assets,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    user_id: UserId,
    new_transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    check_asset(new_transaction.asset_id, user_id, connection)?;

    let id = TransactionId::new();

    connection.execute(
        "INSERT INTO \"transaction\"
            (id, user_id, amount, kind, category_id, category_name, date, note, asset_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            id,
            user_id,
            new_transaction.amount,
            new_transaction.kind,
            new_transaction.category_id,
            new_transaction.category_name,
            to_timestamp(new_transaction.date),
            new_transaction.note,
            new_transaction.asset_id,
            to_timestamp(now_utc()),
        ],
    )?;

    get_transaction(id, user_id, connection)
}

/// Get one of the user's transactions.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist or belongs to another user.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "{SELECT_TRANSACTION} WHERE t.id = ?1 AND t.user_id = ?2"
        ))?
        .query_row(params![id, user_id], map_transaction_row)
        .map_err(|error| error.into())
}

/// Replace every field of one of the user's transactions.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist or belongs to
/// another user, or [Error::InvalidAsset] if the asset is not the user's.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserId,
    new_transaction: &NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    check_asset(new_transaction.asset_id, user_id, connection)?;

    let rows_affected = connection.execute(
        "UPDATE \"transaction\" SET
            amount = ?1, kind = ?2, category_id = ?3, category_name = ?4, date = ?5,
            note = ?6, asset_id = ?7
         WHERE id = ?8 AND user_id = ?9",
        params![
            new_transaction.amount,
            new_transaction.kind,
            new_transaction.category_id,
            new_transaction.category_name,
            to_timestamp(new_transaction.date),
            new_transaction.note,
            new_transaction.asset_id,
            id,
            user_id,
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_transaction(id, user_id, connection)
}

/// Delete one of the user's transactions.
///
/// # Errors
/// Returns [Error::NotFound] if the transaction does not exist or belongs to another user.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        params![id, user_id],
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| row.get(0))
        .map_err(|error| error.into())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        asset::{AssetForm, AssetKind, create_asset, delete_asset},
        auth::{PasswordHash, User, create_user},
        database_id::{AssetId, TransactionId},
        db::initialize,
    };

    use super::{
        NewTransaction, TransactionType, count_transactions, create_transaction,
        delete_transaction, get_transaction, update_transaction,
    };

    fn get_connection_and_users() -> (Connection, User, User) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let alice = create_user(
            "alice@example.com",
            "Alice",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();
        let bob = create_user(
            "bob@example.com",
            "Bob",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();

        (connection, alice, bob)
    }

    fn lunch() -> NewTransaction {
        NewTransaction {
            amount: 32.0,
            kind: TransactionType::Expense,
            category_id: "food".to_owned(),
            category_name: "Food".to_owned(),
            date: datetime!(2026-01-19 12:30 UTC),
            note: Some("Beef noodles".to_owned()),
            asset_id: None,
        }
    }

    fn bank_form() -> AssetForm {
        AssetForm {
            name: "Everyday".to_owned(),
            kind: AssetKind::Bank,
            balance: 100.0,
            icon: None,
            color: None,
        }
    }

    #[test]
    fn create_transaction_succeeds() {
        let (connection, alice, _) = get_connection_and_users();

        let transaction = create_transaction(alice.id, &lunch(), &connection).unwrap();

        assert_eq!(transaction.user_id, alice.id);
        assert_eq!(transaction.amount, 32.0);
        assert_eq!(transaction.kind, TransactionType::Expense);
        assert_eq!(transaction.date, datetime!(2026-01-19 12:30 UTC));
        assert_eq!(transaction.asset, None);
        assert_eq!(count_transactions(&connection), Ok(1));
    }

    #[test]
    fn create_transaction_embeds_asset() {
        let (connection, alice, _) = get_connection_and_users();
        let asset = create_asset(alice.id, &bank_form(), &connection).unwrap();
        let new_transaction = NewTransaction {
            asset_id: Some(asset.id),
            ..lunch()
        };

        let transaction = create_transaction(alice.id, &new_transaction, &connection).unwrap();

        assert_eq!(transaction.asset_id, Some(asset.id));
        assert_eq!(transaction.asset, Some(asset));
    }

    #[test]
    fn create_transaction_with_other_users_asset_fails() {
        let (connection, alice, bob) = get_connection_and_users();
        let asset = create_asset(bob.id, &bank_form(), &connection).unwrap();
        let new_transaction = NewTransaction {
            asset_id: Some(asset.id),
            ..lunch()
        };

        let result = create_transaction(alice.id, &new_transaction, &connection);

        assert_eq!(result, Err(Error::InvalidAsset(asset.id)));
        assert_eq!(count_transactions(&connection), Ok(0));
    }

    #[test]
    fn create_transaction_with_missing_asset_fails() {
        let (connection, alice, _) = get_connection_and_users();
        let asset_id = AssetId::new();
        let new_transaction = NewTransaction {
            asset_id: Some(asset_id),
            ..lunch()
        };

        let result = create_transaction(alice.id, &new_transaction, &connection);

        assert_eq!(result, Err(Error::InvalidAsset(asset_id)));
    }

    #[test]
    fn deleting_asset_unlinks_transactions() {
        let (connection, alice, _) = get_connection_and_users();
        let asset = create_asset(alice.id, &bank_form(), &connection).unwrap();
        let transaction = create_transaction(
            alice.id,
            &NewTransaction {
                asset_id: Some(asset.id),
                ..lunch()
            },
            &connection,
        )
        .unwrap();

        delete_asset(asset.id, alice.id, &connection).unwrap();

        let transaction = get_transaction(transaction.id, alice.id, &connection).unwrap();
        assert_eq!(transaction.asset_id, None);
        assert_eq!(transaction.asset, None);
    }

    #[test]
    fn other_users_cannot_get_transaction() {
        let (connection, alice, bob) = get_connection_and_users();
        let transaction = create_transaction(alice.id, &lunch(), &connection).unwrap();

        assert_eq!(
            get_transaction(transaction.id, bob.id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn update_transaction_replaces_fields() {
        let (connection, alice, _) = get_connection_and_users();
        let transaction = create_transaction(alice.id, &lunch(), &connection).unwrap();
        let salary = NewTransaction {
            amount: 6800.0,
            kind: TransactionType::Income,
            category_id: "salary".to_owned(),
            category_name: "Salary".to_owned(),
            date: datetime!(2026-01-15 10:00 UTC),
            note: None,
            asset_id: None,
        };

        let updated = update_transaction(transaction.id, alice.id, &salary, &connection).unwrap();

        assert_eq!(updated.id, transaction.id);
        assert_eq!(updated.amount, 6800.0);
        assert_eq!(updated.kind, TransactionType::Income);
        assert_eq!(updated.category_id, "salary");
        assert_eq!(updated.note, None);
        assert_eq!(updated.created_at, transaction.created_at);
    }

    #[test]
    fn update_other_users_transaction_fails() {
        let (connection, alice, bob) = get_connection_and_users();
        let transaction = create_transaction(alice.id, &lunch(), &connection).unwrap();

        assert_eq!(
            update_transaction(transaction.id, bob.id, &lunch(), &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_transaction_succeeds() {
        let (connection, alice, _) = get_connection_and_users();
        let transaction = create_transaction(alice.id, &lunch(), &connection).unwrap();

        assert_eq!(delete_transaction(transaction.id, alice.id, &connection), Ok(()));
        assert_eq!(count_transactions(&connection), Ok(0));
    }

    #[test]
    fn delete_missing_transaction_fails() {
        let (connection, alice, _) = get_connection_and_users();

        assert_eq!(
            delete_transaction(TransactionId::new(), alice.id, &connection),
            Err(Error::NotFound)
        );
    }
}
