//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
};

use crate::{
    AppState,
    asset::{
        create_asset_endpoint, delete_asset_endpoint, edit_asset_endpoint, list_assets_endpoint,
    },
    auth::{auth_guard, post_log_in, post_log_out, refresh_access_token, register_user},
    category::get_categories,
    endpoints,
    not_found::get_404_not_found,
    profile::{MAX_AVATAR_SIZE, get_me, update_me, upload_avatar},
    stats::{get_category_stats, get_monthly_stats},
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, edit_transaction_endpoint,
        get_transaction_endpoint, list_transactions_endpoint,
    },
};

/// A JSON body holding a single human readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// The message.
    pub message: String,
}

impl MessageResponse {
    /// Create a response with `message`.
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_owned(),
        }
    }
}

/// Return a router with all the app's routes.
///
/// Routes other than the health check, registration, log in, token refresh,
/// the category catalog and uploaded files require a bearer access token.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_health))
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(post_log_in))
        .route(endpoints::REFRESH_TOKEN, post(refresh_access_token))
        .route(endpoints::CATEGORIES, get(get_categories));

    let protected_routes = Router::new()
        .route(endpoints::LOG_OUT, post(post_log_out))
        .route(endpoints::ME, get(get_me).put(update_me))
        .route(
            endpoints::UPLOAD_AVATAR,
            post(upload_avatar).layer(DefaultBodyLimit::max(MAX_AVATAR_SIZE)),
        )
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            get(get_transaction_endpoint)
                .put(edit_transaction_endpoint)
                .delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::ASSETS,
            get(list_assets_endpoint).post(create_asset_endpoint),
        )
        .route(
            endpoints::ASSET,
            put(edit_asset_endpoint).delete(delete_asset_endpoint),
        )
        .route(endpoints::CATEGORY_STATS, get(get_category_stats))
        .route(endpoints::MONTHLY_STATS, get(get_monthly_stats))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::UPLOADS, ServeDir::new(&state.upload_dir))
        .fallback(get_404_not_found)
        .layer(cors)
        .with_state(state)
}

/// Check that the server is up.
async fn get_health() -> Json<MessageResponse> {
    Json(MessageResponse::new("Expense tracker API is running"))
}
