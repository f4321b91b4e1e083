//! A client for the expense tracker API that refreshes expired access tokens
//! transparently.

mod api;
mod error;
mod token_store;

pub use api::{ApiClient, CategoryInfo, CategoryList};
pub use error::{ClientError, Result};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore, Tokens};
