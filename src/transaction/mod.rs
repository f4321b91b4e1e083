//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and the form for creating and replacing transactions
//! - Database functions for storing, querying, and managing transactions
//! - Route handlers for the transaction endpoints

mod core;
mod endpoints;
mod form;
mod query;

pub use core::{
    NewTransaction, SELECT_TRANSACTION, Transaction, TransactionType, create_transaction,
    create_transaction_table, delete_transaction, get_transaction, map_transaction_row,
    update_transaction,
};
pub use endpoints::{
    create_transaction_endpoint, delete_transaction_endpoint,
    edit_transaction_endpoint, get_transaction_endpoint, list_transactions_endpoint,
};
pub use form::TransactionForm;
pub use query::{TransactionQuery, list_transactions};

#[cfg(test)]
pub use core::count_transactions;
