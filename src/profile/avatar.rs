//! Avatar uploads. Images are saved under the upload directory with a random
//! name and served back from [endpoints::UPLOADS].

use std::path::Path;

use axum::{
    Extension, Json,
    extract::{
        Multipart, State,
        multipart::{Field, MultipartError},
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Error,
    auth::{get_user_by_id, update_profile},
    database_id::UserId,
    db::lock_connection,
    endpoints,
    profile::me::ProfileState,
};

/// The largest avatar upload accepted, in bytes.
pub const MAX_AVATAR_SIZE: usize = 5 * 1024 * 1024;

/// The name of the multipart field holding the image.
const FILE_FIELD: &str = "file";

/// The URL of a newly uploaded avatar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarResponse {
    /// The path the avatar is served from, e.g. "/uploads/<name>.png".
    pub avatar_url: String,
}

/// The file extension for a supported image content type.
fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

fn multipart_error(error: MultipartError) -> Error {
    Error::from_rejection(error.status(), error.body_text())
}

/// Delete an avatar this server saved, ignoring URLs that point elsewhere.
async fn remove_uploaded_avatar(upload_dir: &Path, avatar_url: &str) {
    let Some(file_name) = avatar_url
        .strip_prefix(endpoints::UPLOADS)
        .and_then(|rest| rest.strip_prefix('/'))
    else {
        return;
    };

    if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name.starts_with('.') {
        return;
    }

    if let Err(error) = tokio::fs::remove_file(upload_dir.join(file_name)).await {
        tracing::warn!("Could not remove previous avatar {file_name}: {error}");
    }
}

async fn read_image(field: Field<'_>) -> Result<(&'static str, Vec<u8>), Error> {
    let extension = field
        .content_type()
        .and_then(image_extension)
        .ok_or(Error::NotAnImage)?;

    let data = field.bytes().await.map_err(|error| {
        tracing::debug!("Could not read data from multipart form field: {error}");
        multipart_error(error)
    })?;

    tracing::debug!("Received {} byte avatar", data.len());

    Ok((extension, data.to_vec()))
}

/// A route handler that saves an uploaded avatar image and sets it as the user's avatar.
pub async fn upload_avatar(
    State(state): State<ProfileState>,
    Extension(user_id): Extension<UserId>,
    mut multipart: Multipart,
) -> Result<Json<AvatarResponse>, Error> {
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() == Some(FILE_FIELD) {
            image = Some(read_image(field).await?);
            break;
        }
    }

    let Some((extension, data)) = image else {
        return Err(Error::MultipartError(format!(
            "missing \"{FILE_FIELD}\" field"
        )));
    };

    let file_name = format!("{}.{extension}", Uuid::new_v4());
    tokio::fs::create_dir_all(&state.upload_dir)
        .await
        .map_err(|error| Error::FileError(error.to_string()))?;
    tokio::fs::write(state.upload_dir.join(&file_name), data)
        .await
        .map_err(|error| Error::FileError(error.to_string()))?;

    let avatar_url = format!("{}/{file_name}", endpoints::UPLOADS);

    let previous_avatar = {
        let connection = lock_connection(&state.db_connection)?;
        let user = get_user_by_id(user_id, &connection)?;
        update_profile(user_id, &user.nickname, Some(&avatar_url), &connection)?;
        user.avatar
    };

    if let Some(previous_avatar) = previous_avatar {
        remove_uploaded_avatar(&state.upload_dir, &previous_avatar).await;
    }

    tracing::info!("User {user_id} uploaded avatar {file_name}");

    Ok(Json(AvatarResponse { avatar_url }))
}

#[cfg(test)]
mod tests {
    use axum::{body::Bytes, http::StatusCode};
    use serde_json::Value;

    use crate::{
        MeResponse, endpoints,
        test_utils::{TestApp, get_test_app, register_and_log_in},
    };

    use super::{AvatarResponse, MAX_AVATAR_SIZE, image_extension, remove_uploaded_avatar};

    const BOUNDARY: &str = "MY_BOUNDARY123456789";
    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nnot really a png";

    fn make_multipart(field_name: &str, content_type: &str, data: &[u8]) -> Bytes {
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field_name}\"; filename=\"avatar\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Bytes::from(body)
    }

    async fn upload(
        app: &TestApp,
        access_token: &str,
        body: Bytes,
    ) -> axum_test::TestResponse {
        app.server
            .post(endpoints::UPLOAD_AVATAR)
            .authorization_bearer(access_token)
            .content_type(&format!("multipart/form-data; boundary={BOUNDARY}"))
            .bytes(body)
            .await
    }

    #[test]
    fn maps_image_types_to_extensions() {
        assert_eq!(image_extension("image/png"), Some("png"));
        assert_eq!(image_extension("image/jpeg"), Some("jpg"));
        assert_eq!(image_extension("image/gif"), Some("gif"));
        assert_eq!(image_extension("image/webp"), Some("webp"));
        assert_eq!(image_extension("text/plain"), None);
    }

    #[tokio::test]
    async fn saves_avatar_and_updates_user() {
        let app = get_test_app();
        let tokens = register_and_log_in(&app.server, "foo@bar.baz").await;

        let response = upload(
            &app,
            &tokens.access_token,
            make_multipart("file", "image/png", PNG_BYTES),
        )
        .await;

        response.assert_status_ok();
        let avatar_url = response.json::<AvatarResponse>().avatar_url;
        assert!(avatar_url.starts_with("/uploads/"));
        assert!(avatar_url.ends_with(".png"));

        let file_name = avatar_url.trim_start_matches("/uploads/");
        let saved = std::fs::read(app.state.upload_dir.join(file_name)).unwrap();
        assert_eq!(saved, PNG_BYTES);

        let me = app
            .server
            .get(endpoints::ME)
            .authorization_bearer(&tokens.access_token)
            .await
            .json::<MeResponse>();
        assert_eq!(me.user.avatar.as_deref(), Some(avatar_url.as_str()));
    }

    #[tokio::test]
    async fn uploaded_avatar_is_served() {
        let app = get_test_app();
        let tokens = register_and_log_in(&app.server, "foo@bar.baz").await;
        let avatar_url = upload(
            &app,
            &tokens.access_token,
            make_multipart("file", "image/png", PNG_BYTES),
        )
        .await
        .json::<AvatarResponse>()
        .avatar_url;

        let response = app.server.get(&avatar_url).await;

        response.assert_status_ok();
        assert_eq!(response.as_bytes().as_ref(), PNG_BYTES);
    }

    #[tokio::test]
    async fn rejects_non_image() {
        let app = get_test_app();
        let tokens = register_and_log_in(&app.server, "foo@bar.baz").await;

        upload(
            &app,
            &tokens.access_token,
            make_multipart("file", "text/plain", b"hello"),
        )
        .await
        .assert_status_bad_request();
    }

    #[tokio::test]
    async fn rejects_missing_file_field() {
        let app = get_test_app();
        let tokens = register_and_log_in(&app.server, "foo@bar.baz").await;

        upload(
            &app,
            &tokens.access_token,
            make_multipart("picture", "image/png", PNG_BYTES),
        )
        .await
        .assert_status_bad_request();
    }

    #[tokio::test]
    async fn rejects_avatar_over_size_limit() {
        let app = get_test_app();
        let tokens = register_and_log_in(&app.server, "foo@bar.baz").await;
        let too_big = vec![0u8; MAX_AVATAR_SIZE + 1024];

        let response = upload(
            &app,
            &tokens.access_token,
            make_multipart("file", "image/png", &too_big),
        )
        .await;

        response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            response.json::<Value>()["error"],
            "The request body is too large"
        );
    }

    #[tokio::test]
    async fn replacing_avatar_removes_previous_file() {
        let app = get_test_app();
        let tokens = register_and_log_in(&app.server, "foo@bar.baz").await;
        let body = make_multipart("file", "image/png", PNG_BYTES);

        let first = upload(&app, &tokens.access_token, body.clone())
            .await
            .json::<AvatarResponse>()
            .avatar_url;
        let second = upload(&app, &tokens.access_token, body)
            .await
            .json::<AvatarResponse>()
            .avatar_url;

        let first_path = app
            .state
            .upload_dir
            .join(first.trim_start_matches("/uploads/"));
        let second_path = app
            .state
            .upload_dir
            .join(second.trim_start_matches("/uploads/"));
        assert!(!first_path.exists());
        assert!(second_path.exists());
    }

    #[tokio::test]
    async fn external_avatar_urls_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let outside = dir.path().join("keep.png");
        std::fs::write(&outside, PNG_BYTES).unwrap();
        let upload_dir = dir.path().join("uploads");
        std::fs::create_dir_all(&upload_dir).unwrap();

        remove_uploaded_avatar(&upload_dir, "/uploads/../keep.png").await;
        remove_uploaded_avatar(&upload_dir, "https://example.com/keep.png").await;

        assert!(outside.exists());
    }
}
