//! Profile edits: the nickname and avatar URL.

use axum::{
    Extension, Json,
    extract::State,
};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::{PublicUser, get_user_by_id, update_profile},
    database_id::UserId,
    db::lock_connection,
    extract::JsonBody,
    profile::me::ProfileState,
};

/// The fields of the profile a user may change. Omitted fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileForm {
    /// The new nickname, which must not be blank.
    pub nickname: Option<String>,
    /// The new avatar URL. A blank string removes the avatar.
    pub avatar: Option<String>,
}

/// A route handler that updates the signed-in user's nickname and avatar.
pub async fn update_me(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserId>,
    JsonBody(form): JsonBody<ProfileForm>,
) -> Result<Json<PublicUser>, Error> {
    let nickname = match form.nickname.as_deref().map(str::trim) {
        Some("") => return Err(Error::EmptyNickname),
        nickname => nickname.map(str::to_owned),
    };

    let connection = lock_connection(&state.db_connection)?;
    let user = get_user_by_id(user_id, &connection)?;

    let nickname = nickname.unwrap_or(user.nickname);
    let avatar = match form.avatar.as_deref().map(str::trim) {
        None => user.avatar,
        Some("") => None,
        Some(avatar) => Some(avatar.to_owned()),
    };

    let user = update_profile(user_id, &nickname, avatar.as_deref(), &connection)?;

    Ok(Json(PublicUser::from(&user)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        PublicUser, endpoints,
        test_utils::{get_test_app, register_and_log_in},
    };

    #[tokio::test]
    async fn updates_nickname_and_avatar() {
        let app = get_test_app();
        let tokens = register_and_log_in(&app.server, "foo@bar.baz").await;

        let user = app
            .server
            .put(endpoints::ME)
            .authorization_bearer(&tokens.access_token)
            .json(&json!({ "nickname": "  Foo  ", "avatar": "/uploads/foo.png" }))
            .await
            .json::<PublicUser>();

        assert_eq!(user.id, tokens.user.id);
        assert_eq!(user.nickname, "Foo");
        assert_eq!(user.avatar.as_deref(), Some("/uploads/foo.png"));
    }

    #[tokio::test]
    async fn omitted_fields_are_kept() {
        let app = get_test_app();
        let tokens = register_and_log_in(&app.server, "foo@bar.baz").await;
        app.server
            .put(endpoints::ME)
            .authorization_bearer(&tokens.access_token)
            .json(&json!({ "avatar": "/uploads/foo.png" }))
            .await
            .assert_status_ok();

        let user = app
            .server
            .put(endpoints::ME)
            .authorization_bearer(&tokens.access_token)
            .json(&json!({ "nickname": "Bar" }))
            .await
            .json::<PublicUser>();

        assert_eq!(user.nickname, "Bar");
        assert_eq!(user.avatar.as_deref(), Some("/uploads/foo.png"));
    }

    #[tokio::test]
    async fn blank_avatar_removes_it() {
        let app = get_test_app();
        let tokens = register_and_log_in(&app.server, "foo@bar.baz").await;
        app.server
            .put(endpoints::ME)
            .authorization_bearer(&tokens.access_token)
            .json(&json!({ "avatar": "/uploads/foo.png" }))
            .await
            .assert_status_ok();

        let user = app
            .server
            .put(endpoints::ME)
            .authorization_bearer(&tokens.access_token)
            .json(&json!({ "avatar": "" }))
            .await
            .json::<PublicUser>();

        assert_eq!(user.avatar, None);
    }

    #[tokio::test]
    async fn blank_nickname_is_rejected() {
        let app = get_test_app();
        let tokens = register_and_log_in(&app.server, "foo@bar.baz").await;

        let response = app
            .server
            .put(endpoints::ME)
            .authorization_bearer(&tokens.access_token)
            .json(&json!({ "nickname": "   " }))
            .await;

        response.assert_status_bad_request();
        assert_eq!(
            response.json::<serde_json::Value>()["error"],
            "Nickname cannot be empty"
        );
    }
}
