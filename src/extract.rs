//! Extractors that answer malformed requests with the crate's JSON [Error] body
//! instead of axum's plain-text rejections.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::{StatusCode, request::Parts},
};
use serde::de::DeserializeOwned;

use crate::Error;

impl Error {
    /// Convert an extractor rejection, keeping its status code.
    pub(crate) fn from_rejection(status: StatusCode, message: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Error::PayloadTooLarge
        } else {
            Error::InvalidRequest { status, message }
        }
    }
}

/// A JSON request body.
#[derive(Debug, Clone, Copy)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!("Rejected JSON body: {rejection}");
                Err(Error::from_rejection(rejection.status(), rejection.body_text()))
            }
        }
    }
}

/// Query string parameters.
#[derive(Debug, Clone, Copy)]
pub struct QueryParams<T>(pub T);

impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!("Rejected query string: {rejection}");
                Err(Error::from_rejection(rejection.status(), rejection.body_text()))
            }
        }
    }
}

/// A resource ID taken from the URL path.
///
/// An ID that does not parse cannot name an existing resource, so it is
/// answered the same way as a missing one.
#[derive(Debug, Clone, Copy)]
pub struct PathId<T>(pub T);

impl<T, S> FromRequestParts<S> for PathId<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(Self(value)),
            Err(rejection) => {
                tracing::debug!("Rejected path parameter: {rejection}");
                Err(Error::NotFound)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use serde::Deserialize;
    use serde_json::{Value, json};

    use crate::database_id::AssetId;

    use super::{JsonBody, PathId, QueryParams};

    #[derive(Debug, Deserialize)]
    struct Body {
        count: u32,
    }

    #[derive(Debug, Deserialize)]
    struct Params {
        limit: Option<u32>,
    }

    fn get_test_server() -> TestServer {
        let app = Router::new()
            .route(
                "/body",
                post(|JsonBody(body): JsonBody<Body>| async move { body.count.to_string() }),
            )
            .route(
                "/query",
                post(|QueryParams(params): QueryParams<Params>| async move {
                    format!("{:?}", params.limit)
                }),
            )
            .route(
                "/items/{id}",
                post(|PathId(id): PathId<AssetId>| async move { id.to_string() }),
            );

        TestServer::new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn accepts_valid_json() {
        let server = get_test_server();

        let response = server.post("/body").json(&json!({ "count": 3 })).await;

        response.assert_status_ok();
        response.assert_text("3");
    }

    #[tokio::test]
    async fn missing_content_type_is_json_error() {
        let server = get_test_server();

        let response = server.post("/body").text("count=3").await;

        response.assert_status(StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(response.json::<Value>()["error"].is_string());
    }

    #[tokio::test]
    async fn wrong_field_type_is_json_error() {
        let server = get_test_server();

        let response = server.post("/body").json(&json!({ "count": "three" })).await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert!(response.json::<Value>()["error"].is_string());
    }

    #[tokio::test]
    async fn bad_query_is_json_error() {
        let server = get_test_server();

        let response = server.post("/query").add_query_param("limit", "-1").await;

        response.assert_status_bad_request();
        assert!(response.json::<Value>()["error"].is_string());
    }

    #[tokio::test]
    async fn malformed_id_is_not_found() {
        let server = get_test_server();

        let response = server.post("/items/not-a-uuid").await;

        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["error"], "Not found");
    }
}
