//! Error body normalization
//!
//! Framework rejections (malformed JSON, wrong content type, unknown route)
//! come back as text/plain. This rewrites them into the `{error, msg}` shape
//! handlers use, without the parser detail.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Probe and scrape endpoints answer in plain text on purpose
const PLAIN_TEXT_PATHS: [&str; 3] = ["/health", "/ready", "/metrics"];

pub async fn normalize_error_response(request: Request<Body>, next: Next) -> Response {
    let skip = PLAIN_TEXT_PATHS.contains(&request.uri().path());
    let response = next.run(request).await;

    let status = response.status();
    if skip || !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));
    if is_json {
        return response;
    }

    generic_error_response(status)
}

fn generic_error_response(status: StatusCode) -> Response {
    let (error, msg) = match status {
        StatusCode::BAD_REQUEST => ("bad_request", "Invalid request body"),
        StatusCode::UNAUTHORIZED => ("unauthorized", "Not authorized"),
        StatusCode::NOT_FOUND => ("not_found", "Not found"),
        StatusCode::METHOD_NOT_ALLOWED => ("method_not_allowed", "Method not allowed"),
        StatusCode::PAYLOAD_TOO_LARGE => ("payload_too_large", "Request body too large"),
        StatusCode::UNPROCESSABLE_ENTITY => ("validation_error", "Invalid request body"),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => {
            ("unsupported_media_type", "Expected a JSON request body")
        }
        _ if status.is_client_error() => ("client_error", "Client error"),
        _ => ("internal_error", "An internal error occurred"),
    };

    (status, axum::Json(json!({ "error": error, "msg": msg }))).into_response()
}
