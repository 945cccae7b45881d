// Stats API response helpers

use hyper::{header, Response, StatusCode};
use serde::Serialize;

use crate::http::response::full_body;
use crate::http::FsBody;
use crate::logger;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Build a pretty-printed JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<FsBody> {
    match serde_json::to_string_pretty(body) {
        Ok(json) => json_text(status, json),
        Err(e) => {
            logger::log_api_error(&format!("Failed to serialize response: {e}"));
            json_text(
                StatusCode::INTERNAL_SERVER_ERROR,
                r#"{"error":"Internal server error"}"#.to_string(),
            )
        }
    }
}

/// 404 Not Found response listing the available endpoints
pub fn not_found() -> Response<FsBody> {
    json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({
            "error": "Not Found",
            "available_endpoints": ["/debug/vars", "/stats"],
        }),
    )
}

/// 405 Method Not Allowed response
pub fn method_not_allowed() -> Response<FsBody> {
    let mut resp = json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &serde_json::json!({ "error": "Method Not Allowed" }),
    );
    resp.headers_mut()
        .insert(header::ALLOW, header::HeaderValue::from_static("GET, HEAD"));
    resp
}

fn json_text(status: StatusCode, json: String) -> Response<FsBody> {
    let len = json.len();
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, len)
        .header(header::CACHE_CONTROL, "no-cache")
        .body(full_body(json))
        .unwrap_or_else(|e| {
            logger::log_api_error(&format!("Failed to build response: {e}"));
            let mut resp = Response::new(full_body("Error"));
            *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            resp
        })
}
