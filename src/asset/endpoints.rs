//! The route handlers for creating, listing, editing and deleting assets.

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    Error, MessageResponse,
    asset::core::{
        Asset, AssetForm, AssetState, create_asset, delete_asset, list_assets, update_asset,
    },
    database_id::{AssetId, UserId},
    db::lock_connection,
    extract::{JsonBody, PathId},
};

/// A route handler for creating a new asset, responds with the asset and 201 Created.
pub async fn create_asset_endpoint(
    State(state): State<AssetState>,
    Extension(user_id): Extension<UserId>,
    JsonBody(form): JsonBody<AssetForm>,
) -> Result<impl IntoResponse, Error> {
    let form = form.validate()?;
    let asset = create_asset(user_id, &form, &*lock_connection(&state.db_connection)?)?;

    Ok((StatusCode::CREATED, Json(asset)))
}

/// A route handler for listing the user's assets.
pub async fn list_assets_endpoint(
    State(state): State<AssetState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Vec<Asset>>, Error> {
    list_assets(user_id, &*lock_connection(&state.db_connection)?).map(Json)
}

/// A route handler for replacing the fields of an asset.
pub async fn edit_asset_endpoint(
    State(state): State<AssetState>,
    Extension(user_id): Extension<UserId>,
    PathId(asset_id): PathId<AssetId>,
    JsonBody(form): JsonBody<AssetForm>,
) -> Result<Json<Asset>, Error> {
    let form = form.validate()?;

    update_asset(
        asset_id,
        user_id,
        &form,
        &*lock_connection(&state.db_connection)?,
    )
    .map(Json)
}

/// A route handler for deleting an asset.
pub async fn delete_asset_endpoint(
    State(state): State<AssetState>,
    Extension(user_id): Extension<UserId>,
    PathId(asset_id): PathId<AssetId>,
) -> Result<Json<MessageResponse>, Error> {
    delete_asset(asset_id, user_id, &*lock_connection(&state.db_connection)?)
        .inspect_err(|error| tracing::debug!("Could not delete asset {asset_id}: {error}"))?;

    Ok(Json(MessageResponse::new("Asset deleted")))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        Asset, AssetKind,
        database_id::AssetId,
        endpoints::{self, format_endpoint},
        test_utils::{get_test_app, register_and_log_in},
    };

    #[tokio::test]
    async fn create_and_list_assets() {
        let app = get_test_app();
        let tokens = register_and_log_in(&app.server, "foo@bar.baz").await;

        let response = app
            .server
            .post(endpoints::ASSETS)
            .authorization_bearer(&tokens.access_token)
            .json(&json!({ "name": "Everyday", "type": "bank", "balance": 1500.0 }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let created = response.json::<Asset>();
        assert_eq!(created.name, "Everyday");
        assert_eq!(created.kind, AssetKind::Bank);

        let assets = app
            .server
            .get(endpoints::ASSETS)
            .authorization_bearer(&tokens.access_token)
            .await
            .json::<Vec<Asset>>();
        assert_eq!(assets, vec![created]);
    }

    #[tokio::test]
    async fn asset_json_uses_type_and_camel_case() {
        let app = get_test_app();
        let tokens = register_and_log_in(&app.server, "foo@bar.baz").await;

        let body = app
            .server
            .post(endpoints::ASSETS)
            .authorization_bearer(&tokens.access_token)
            .json(&json!({ "name": "Wallet", "type": "cash" }))
            .await
            .json::<Value>();

        assert_eq!(body["type"], "cash");
        assert_eq!(body["balance"], 0.0);
        assert!(body["createdAt"].is_string());
        assert!(body["id"].is_string());
    }

    #[tokio::test]
    async fn create_asset_with_blank_name_fails() {
        let app = get_test_app();
        let tokens = register_and_log_in(&app.server, "foo@bar.baz").await;

        app.server
            .post(endpoints::ASSETS)
            .authorization_bearer(&tokens.access_token)
            .json(&json!({ "name": "  ", "type": "bank" }))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn assets_require_access_token() {
        let app = get_test_app();

        app.server
            .get(endpoints::ASSETS)
            .await
            .assert_status_unauthorized();
    }

    #[tokio::test]
    async fn edit_asset() {
        let app = get_test_app();
        let tokens = register_and_log_in(&app.server, "foo@bar.baz").await;
        let created = app
            .server
            .post(endpoints::ASSETS)
            .authorization_bearer(&tokens.access_token)
            .json(&json!({ "name": "Everyday", "type": "bank", "balance": 1500.0 }))
            .await
            .json::<Asset>();

        let response = app
            .server
            .put(&format_endpoint(endpoints::ASSET, created.id))
            .authorization_bearer(&tokens.access_token)
            .json(&json!({ "name": "Shares", "type": "stock", "balance": 99.5 }))
            .await;

        response.assert_status_ok();
        let updated = response.json::<Asset>();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Shares");
        assert_eq!(updated.kind, AssetKind::Stock);
        assert_eq!(updated.balance, 99.5);
    }

    #[tokio::test]
    async fn other_users_asset_is_not_found() {
        let app = get_test_app();
        let alice = register_and_log_in(&app.server, "alice@example.com").await;
        let bob = register_and_log_in(&app.server, "bob@example.com").await;
        let created = app
            .server
            .post(endpoints::ASSETS)
            .authorization_bearer(&alice.access_token)
            .json(&json!({ "name": "Everyday", "type": "bank" }))
            .await
            .json::<Asset>();
        let path = format_endpoint(endpoints::ASSET, created.id);

        app.server
            .put(&path)
            .authorization_bearer(&bob.access_token)
            .json(&json!({ "name": "Mine", "type": "bank" }))
            .await
            .assert_status_not_found();
        app.server
            .delete(&path)
            .authorization_bearer(&bob.access_token)
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn delete_asset() {
        let app = get_test_app();
        let tokens = register_and_log_in(&app.server, "foo@bar.baz").await;
        let created = app
            .server
            .post(endpoints::ASSETS)
            .authorization_bearer(&tokens.access_token)
            .json(&json!({ "name": "Everyday", "type": "bank" }))
            .await
            .json::<Asset>();

        let response = app
            .server
            .delete(&format_endpoint(endpoints::ASSET, created.id))
            .authorization_bearer(&tokens.access_token)
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["message"], "Asset deleted");
        let assets = app
            .server
            .get(endpoints::ASSETS)
            .authorization_bearer(&tokens.access_token)
            .await
            .json::<Vec<Asset>>();
        assert!(assets.is_empty());
    }

    #[tokio::test]
    async fn delete_missing_asset_is_not_found() {
        let app = get_test_app();
        let tokens = register_and_log_in(&app.server, "foo@bar.baz").await;

        app.server
            .delete(&format_endpoint(endpoints::ASSET, AssetId::new()))
            .authorization_bearer(&tokens.access_token)
            .await
            .assert_status_not_found();
    }
}
