//! Middleware for logging requests and responses.

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

/// Bodies longer than this many bytes are truncated in `info` logs.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// The JSON fields whose values never appear in the logs.
const REDACTED_FIELDS: [&str; 3] = ["password", "accessToken", "refreshToken"];

const REDACTED: &str = "********";

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level.
/// Passwords and tokens in JSON bodies are redacted. Bodies that are not text,
/// such as file uploads and images, are passed through without being read.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    let request = if let Some(content_type) = binary_content_type(&parts.headers) {
        log_request(&parts, &format!("<{content_type}>"));
        Request::from_parts(parts, body)
    } else {
        let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::error!("Could not read request body: {error}");
                return StatusCode::BAD_REQUEST.into_response();
            }
        };
        log_request(&parts, &redact(&String::from_utf8_lossy(&body_bytes)));
        Request::from_parts(parts, Body::from(body_bytes))
    };

    let response = next.run(request).await;

    let (parts, body) = response.into_parts();
    if let Some(content_type) = binary_content_type(&parts.headers) {
        log_response(&parts, &format!("<{content_type}>"));
        return Response::from_parts(parts, body);
    }

    let body_bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    log_response(&parts, &redact(&String::from_utf8_lossy(&body_bytes)));

    Response::from_parts(parts, Body::from(body_bytes))
}

/// The content type of a body that should not be logged as text.
///
/// Bodies without a content type are treated as text.
fn binary_content_type(headers: &HeaderMap) -> Option<&str> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .map(|value| value.to_str().unwrap_or("unknown"))?;
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let is_text = essence.starts_with("text/")
        || essence == "application/json"
        || essence.ends_with("+json")
        || essence == "application/x-www-form-urlencoded";

    if is_text { None } else { Some(content_type) }
}

/// Replace the values of sensitive fields in a JSON body.
///
/// Bodies that are not JSON are returned unchanged.
fn redact(body: &str) -> String {
    let Ok(mut value) = serde_json::from_str::<Value>(body) else {
        return body.to_owned();
    };

    if redact_value(&mut value) {
        value.to_string()
    } else {
        body.to_owned()
    }
}

/// Returns whether anything was redacted.
fn redact_value(value: &mut Value) -> bool {
    match value {
        Value::Object(map) => {
            let mut redacted = false;

            for (key, field) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *field = Value::String(REDACTED.to_owned());
                    redacted = true;
                } else {
                    redacted |= redact_value(field);
                }
            }

            redacted
        }
        Value::Array(items) => items
            .iter_mut()
            .fold(false, |redacted, item| redact_value(item) || redacted),
        _ => false,
    }
}

/// The longest prefix of `text` that is at most `limit` bytes and ends on a char boundary.
fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }

    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }

    &text[..end]
}

fn log_request(parts: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {} {}\nbody: {}...",
            parts.method,
            parts.uri,
            truncate(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!(
            "Received request: {} {}\nbody: {body:?}",
            parts.method,
            parts.uri
        );
    }
}

fn log_response(parts: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {}\nbody: {}...",
            parts.status,
            truncate(body, LOG_BODY_LENGTH_LIMIT)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {}\nbody: {body:?}", parts.status);
    }
}
