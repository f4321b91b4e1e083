//! Bearer-token authentication: users, passwords, the access/refresh token
//! pair and the endpoints for registering, logging in, refreshing and logging out.

mod log_in;
mod log_out;
mod middleware;
mod password;
mod refresh;
mod refresh_token;
mod register;
mod token;
mod user;

pub use log_in::{LogInForm, LogInResponse, post_log_in};
pub use log_out::post_log_out;
pub use middleware::auth_guard;
pub use password::{PasswordHash, ValidatedPassword};
pub use refresh::{RefreshForm, RefreshResponse, refresh_access_token};
pub use refresh_token::create_refresh_token_table;
pub use register::{RegisterForm, RegisterResponse, register_user};
pub use token::TokenKeys;
pub use user::{
    PublicUser, User, create_user, create_user_table,
    get_user_by_email, get_user_by_id, nickname_or_default, normalize_email, update_profile,
};
