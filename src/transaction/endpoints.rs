//! The route handlers for transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;

use crate::{
    AppState, Error, MessageResponse,
    database_id::{TransactionId, UserId},
    db::lock_connection,
    extract::{JsonBody, PathId, QueryParams},
    transaction::{
        Transaction, TransactionForm, TransactionQuery, create_transaction, delete_transaction,
        get_transaction, list_transactions, update_transaction,
    },
};

/// The state needed by the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler for creating a new transaction, responds with the transaction and 201 Created.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    JsonBody(form): JsonBody<TransactionForm>,
) -> Result<impl IntoResponse, Error> {
    let new_transaction = form.validate(&state.local_timezone)?;
    let transaction = create_transaction(
        user_id,
        &new_transaction,
        &*lock_connection(&state.db_connection)?,
    )?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// A route handler for listing the user's transactions, newest first.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    QueryParams(query): QueryParams<TransactionQuery>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let window = query.window(&state.local_timezone)?;

    list_transactions(
        user_id,
        window,
        query.limit(),
        &*lock_connection(&state.db_connection)?,
    )
    .map(Json)
}

/// A route handler for getting a single transaction.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    PathId(transaction_id): PathId<TransactionId>,
) -> Result<Json<Transaction>, Error> {
    get_transaction(
        transaction_id,
        user_id,
        &*lock_connection(&state.db_connection)?,
    )
    .map(Json)
}

/// A route handler for replacing a transaction.
pub async fn edit_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    PathId(transaction_id): PathId<TransactionId>,
    JsonBody(form): JsonBody<TransactionForm>,
) -> Result<Json<Transaction>, Error> {
    let new_transaction = form.validate(&state.local_timezone)?;

    update_transaction(
        transaction_id,
        user_id,
        &new_transaction,
        &*lock_connection(&state.db_connection)?,
    )
    .map(Json)
}

/// A route handler for deleting a transaction.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserId>,
    PathId(transaction_id): PathId<TransactionId>,
) -> Result<Json<MessageResponse>, Error> {
    delete_transaction(
        transaction_id,
        user_id,
        &*lock_connection(&state.db_connection)?,
    )?;

    Ok(Json(MessageResponse::new("Transaction deleted")))
}
