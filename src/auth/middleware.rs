//! Authentication middleware that checks bearer access tokens.

use std::sync::Arc;

use axum::{
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{AppState, Error, auth::TokenKeys};

/// The state needed for the auth middleware
#[derive(Debug, Clone)]
pub struct AuthState {
    /// The keys for verifying access tokens.
    pub token_keys: Arc<TokenKeys>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            token_keys: state.token_keys.clone(),
        }
    }
}

/// Middleware function that checks for a valid access token in the `Authorization` header.
///
/// The user ID is placed into the request extensions and the request executed
/// normally if the token is valid, otherwise a 401 response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserId>` to receive the user ID.
pub async fn auth_guard(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(Authorization(bearer)) = request.headers().typed_get::<Authorization<Bearer>>()
    else {
        return Error::MissingToken.into_response();
    };

    match state.token_keys.verify_access_token(bearer.token()) {
        Ok(claims) => {
            request.extensions_mut().insert(claims.sub);
            next.run(request).await
        }
        Err(error) => error.into_response(),
    }
}
