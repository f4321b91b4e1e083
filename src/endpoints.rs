//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/assets/{asset_id}', use [format_endpoint].

use std::fmt::Display;

/// The root route which answers with a short health message.
pub const ROOT: &str = "/";
/// The route for registering a new user.
pub const REGISTER: &str = "/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/auth/login";
/// The route for exchanging a refresh token for a new access token.
pub const REFRESH_TOKEN: &str = "/auth/refresh-token";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/auth/logout";
/// The route for the current user's profile and summary.
pub const ME: &str = "/users/me";
/// The route for uploading the current user's avatar.
pub const UPLOAD_AVATAR: &str = "/users/upload-avatar";
/// The route for the built-in category catalog.
pub const CATEGORIES: &str = "/categories";
/// The route to access transactions.
pub const TRANSACTIONS: &str = "/transactions";
/// The route to access a single transaction.
pub const TRANSACTION: &str = "/transactions/{transaction_id}";
/// The route to access assets.
pub const ASSETS: &str = "/assets";
/// The route to access a single asset.
pub const ASSET: &str = "/assets/{asset_id}";
/// The route for totals grouped by category.
pub const CATEGORY_STATS: &str = "/stats/category";
/// The route for totals grouped by month.
pub const MONTHLY_STATS: &str = "/stats/monthly";
/// The route uploaded files are served from.
pub const UPLOADS: &str = "/uploads";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/assets/{asset_id}', '{asset_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: impl Display) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_string();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
