//! The endpoint for registering a new user.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{PasswordHash, ValidatedPassword, create_user, nickname_or_default, normalize_email},
    database_id::UserId,
    db::lock_connection,
    extract::JsonBody,
};

/// The state needed to register a user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The database connection for creating users.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The bcrypt cost for hashing the new password.
    pub password_cost: u32,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            password_cost: state.password_cost,
        }
    }
}

/// The data for registering a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    /// The email address to log in with.
    pub email: String,
    /// The plain-text password, checked for strength before hashing.
    pub password: String,
    /// The name to show in the app. Defaults to "New user".
    #[serde(default)]
    pub nickname: Option<String>,
}

/// The response to a successful registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    /// A human readable confirmation.
    pub message: String,
    /// The ID of the new user.
    pub user_id: UserId,
}

/// A route handler for registering a new user.
///
/// # Errors
///
/// Returns a 400 error if the email is invalid or taken, or the password is too weak.
pub async fn register_user(
    State(state): State<RegistrationState>,
    JsonBody(form): JsonBody<RegisterForm>,
) -> Result<impl IntoResponse, Error> {
    let email = normalize_email(&form.email)?;
    let password = ValidatedPassword::for_email(&form.password, &email)?;
    let nickname = nickname_or_default(form.nickname.as_deref());
    let password_hash = PasswordHash::new(password, state.password_cost)?;

    let user = create_user(
        &email,
        &nickname,
        password_hash,
        &*lock_connection(&state.db_connection)?,
    )?;

    tracing::info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful".to_owned(),
            user_id: user.id,
        }),
    ))
}

#[cfg(test)]
mod register_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        RegisterResponse,
        auth::{get_user_by_id, user::DEFAULT_NICKNAME},
        db::lock_connection,
        endpoints,
        test_utils::{TEST_PASSWORD, get_test_app},
    };

    #[tokio::test]
    async fn register_creates_user() {
        let app = get_test_app();

        let response = app
            .server
            .post(endpoints::REGISTER)
            .json(&json!({
                "email": " Foo@Bar.baz ",
                "password": TEST_PASSWORD,
                "nickname": "Foo",
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<RegisterResponse>();
        let user =
            get_user_by_id(body.user_id, &lock_connection(&app.state.db_connection).unwrap())
                .unwrap();
        assert_eq!(user.email, "foo@bar.baz");
        assert_eq!(user.nickname, "Foo");
        assert!(user.password_hash.verify(TEST_PASSWORD).unwrap());
    }

    #[tokio::test]
    async fn register_without_nickname_uses_default() {
        let app = get_test_app();

        let response = app
            .server
            .post(endpoints::REGISTER)
            .json(&json!({ "email": "foo@bar.baz", "password": TEST_PASSWORD }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body = response.json::<RegisterResponse>();
        let user =
            get_user_by_id(body.user_id, &lock_connection(&app.state.db_connection).unwrap())
                .unwrap();
        assert_eq!(user.nickname, DEFAULT_NICKNAME);
    }

    #[tokio::test]
    async fn register_twice_with_same_email_fails() {
        let app = get_test_app();
        let form = json!({ "email": "foo@bar.baz", "password": TEST_PASSWORD });
        app.server
            .post(endpoints::REGISTER)
            .json(&form)
            .await
            .assert_status(StatusCode::CREATED);

        let response = app
            .server
            .post(endpoints::REGISTER)
            .json(&json!({ "email": "FOO@bar.baz", "password": TEST_PASSWORD }))
            .await;

        response.assert_status_bad_request();
        let body = response.json::<Value>();
        assert_eq!(
            body["error"],
            "Registration failed, the email address may already be in use."
        );
    }

    #[tokio::test]
    async fn register_with_weak_password_fails() {
        let app = get_test_app();

        let response = app
            .server
            .post(endpoints::REGISTER)
            .json(&json!({ "email": "foo@bar.baz", "password": "password" }))
            .await;

        response.assert_status_bad_request();
        let body = response.json::<Value>();
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Password is too weak")
        );
    }

    #[tokio::test]
    async fn register_with_email_as_password_fails() {
        let app = get_test_app();

        let response = app
            .server
            .post(endpoints::REGISTER)
            .json(&json!({ "email": "zanzibarquokka@example.com", "password": "zanzibarquokka" }))
            .await;

        response.assert_status_bad_request();
        let body = response.json::<Value>();
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Password is too weak")
        );
    }

    #[tokio::test]
    async fn register_with_invalid_email_fails() {
        let app = get_test_app();

        let response = app
            .server
            .post(endpoints::REGISTER)
            .json(&json!({ "email": "not-an-email", "password": TEST_PASSWORD }))
            .await;

        response.assert_status_bad_request();
    }
}
