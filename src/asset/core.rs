//! The asset type, its table, and the queries for managing a user's assets.

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
};

use axum::extract::FromRef;
use rusqlite::{
    Connection, Row, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    database_id::{AssetId, UserId},
    db::{get_timestamp, now_utc, to_timestamp},
};

/// What sort of account an asset is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// A bank account.
    Bank,
    /// A share portfolio.
    Stock,
    /// A managed fund.
    Fund,
    /// Physical cash.
    Cash,
    /// Anything else.
    Other,
}

impl AssetKind {
    fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Bank => "bank",
            AssetKind::Stock => "stock",
            AssetKind::Fund => "fund",
            AssetKind::Cash => "cash",
            AssetKind::Other => "other",
        }
    }
}

impl Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for AssetKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for AssetKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "bank" => Ok(AssetKind::Bank),
            "stock" => Ok(AssetKind::Stock),
            "fund" => Ok(AssetKind::Fund),
            "cash" => Ok(AssetKind::Cash),
            "other" => Ok(AssetKind::Other),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// A named account with a balance that transactions can be attributed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// The ID of the asset.
    pub id: AssetId,
    /// The name shown to the user, e.g. "Everyday account".
    pub name: String,
    /// What sort of account the asset is.
    #[serde(rename = "type")]
    pub kind: AssetKind,
    /// The balance as entered by the user.
    pub balance: f64,
    /// An optional emoji or icon name.
    pub icon: Option<String>,
    /// An optional CSS colour.
    pub color: Option<String>,
    /// When the asset was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The data for creating or replacing an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetForm {
    /// The name shown to the user.
    pub name: String,
    /// What sort of account the asset is.
    #[serde(rename = "type")]
    pub kind: AssetKind,
    /// The current balance.
    #[serde(default)]
    pub balance: f64,
    /// An optional emoji or icon name.
    #[serde(default)]
    pub icon: Option<String>,
    /// An optional CSS colour.
    #[serde(default)]
    pub color: Option<String>,
}

impl AssetForm {
    /// Trim the name and check the form can be stored.
    ///
    /// # Errors
    /// Returns [Error::EmptyAssetName] for a blank name or [Error::InvalidBalance]
    /// for a balance that is NaN or infinite.
    pub fn validate(mut self) -> Result<Self, Error> {
        self.name = self.name.trim().to_owned();

        if self.name.is_empty() {
            return Err(Error::EmptyAssetName);
        }

        if !self.balance.is_finite() {
            return Err(Error::InvalidBalance(self.balance));
        }

        Ok(self)
    }
}

/// The state needed by the asset endpoints.
#[derive(Debug, Clone)]
pub struct AssetState {
    /// The database connection for managing assets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AssetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create the asset table.
///
/// # Errors
/// Returns an error if the SQL query failed.
pub fn create_asset_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS asset (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            balance REAL NOT NULL,
            icon TEXT,
            color TEXT,
            created_at INTEGER NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_asset_user ON asset(user_id)",
        (),
    )?;

    Ok(())
}

/// The columns [map_asset_row] expects, in order.
pub const ASSET_COLUMNS: &str = "id, name, kind, balance, icon, color, created_at";

/// Map a row selected with [ASSET_COLUMNS] to an asset.
pub fn map_asset_row(row: &Row) -> Result<Asset, rusqlite::Error> {
    map_asset_row_with_offset(row, 0)
}

/// Map the asset columns starting at `offset`, for queries that join assets
/// onto other rows.
pub fn map_asset_row_with_offset(row: &Row, offset: usize) -> Result<Asset, rusqlite::Error> {
    Ok(Asset {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        kind: row.get(offset + 2)?,
        balance: row.get(offset + 3)?,
        icon: row.get(offset + 4)?,
        color: row.get(offset + 5)?,
        created_at: get_timestamp(row, offset + 6)?,
    })
}

/// Create a new asset owned by `user_id`.
///
/// `form` should already be validated with [AssetForm::validate].
///
/// # Errors
/// Returns [Error::SqlError] if the asset could not be inserted.
pub fn create_asset(
    user_id: UserId,
    form: &AssetForm,
    connection: &Connection,
) -> Result<Asset, Error> {
    let asset = Asset {
        id: AssetId::new(),
        name: form.name.clone(),
        kind: form.kind,
        balance: form.balance,
        icon: form.icon.clone(),
        color: form.color.clone(),
        created_at: now_utc(),
    };

    connection.execute(
        "INSERT INTO asset (id, user_id, name, kind, balance, icon, color, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            asset.id,
            user_id,
            asset.name,
            asset.kind,
            asset.balance,
            asset.icon,
            asset.color,
            to_timestamp(asset.created_at),
        ],
    )?;

    Ok(asset)
}

/// Get one of the user's assets.
///
/// # Errors
/// Returns [Error::NotFound] if the asset does not exist or belongs to another user.
pub fn get_asset(asset_id: AssetId, user_id: UserId, connection: &Connection) -> Result<Asset, Error> {
    connection
        .prepare(&format!(
            "SELECT {ASSET_COLUMNS} FROM asset WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row(params![asset_id, user_id], map_asset_row)
        .map_err(|error| error.into())
}

/// Get all of the user's assets, oldest first.
///
/// # Errors
/// Returns [Error::SqlError] if the query failed.
pub fn list_assets(user_id: UserId, connection: &Connection) -> Result<Vec<Asset>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ASSET_COLUMNS} FROM asset WHERE user_id = ?1 ORDER BY created_at ASC, rowid ASC"
        ))?
        .query_map(params![user_id], map_asset_row)?
        .map(|maybe_asset| maybe_asset.map_err(Error::from))
        .collect()
}

/// Replace the fields of one of the user's assets.
///
/// # Errors
/// Returns [Error::NotFound] if the asset does not exist or belongs to another user.
pub fn update_asset(
    asset_id: AssetId,
    user_id: UserId,
    form: &AssetForm,
    connection: &Connection,
) -> Result<Asset, Error> {
    let rows_affected = connection.execute(
        "UPDATE asset SET name = ?1, kind = ?2, balance = ?3, icon = ?4, color = ?5
         WHERE id = ?6 AND user_id = ?7",
        params![
            form.name,
            form.kind,
            form.balance,
            form.icon,
            form.color,
            asset_id,
            user_id
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_asset(asset_id, user_id, connection)
}

/// Delete one of the user's assets. Transactions linked to it are kept and unlinked.
///
/// # Errors
/// Returns [Error::NotFound] if the asset does not exist or belongs to another user.
pub fn delete_asset(asset_id: AssetId, user_id: UserId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM asset WHERE id = ?1 AND user_id = ?2",
        params![asset_id, user_id],
    )?;

    match rows_affected {
        0 => Err(Error::NotFound),
        _ => Ok(()),
    }
}

/// Whether `asset_id` is one of the user's assets.
///
/// # Errors
/// Returns [Error::SqlError] if the query failed.
pub fn asset_belongs_to(
    asset_id: AssetId,
    user_id: UserId,
    connection: &Connection,
) -> Result<bool, Error> {
    connection
        .query_row(
            "SELECT EXISTS(SELECT 1 FROM asset WHERE id = ?1 AND user_id = ?2)",
            params![asset_id, user_id],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}
