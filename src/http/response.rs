//! HTTP response building module
//!
//! Builders for every status the file server emits. File bodies are streamed
//! from an open handle; everything else is a small in-memory body.

use futures_util::TryStreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::header::{self, HeaderValue};
use hyper::{Response, StatusCode};
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;

use super::mime::HTML_CONTENT_TYPE;

/// Response body used by every handler
pub type FsBody = UnsyncBoxBody<Bytes, std::io::Error>;

pub fn empty_body() -> FsBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

pub fn full_body(data: impl Into<Bytes>) -> FsBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Stream exactly `len` bytes from the file's current position
pub fn file_body(file: tokio::fs::File, len: u64) -> FsBody {
    let stream = ReaderStream::new(file.take(len)).map_ok(Frame::data);
    StreamBody::new(stream).boxed_unsync()
}

/// Headers shared by every response about one file
#[derive(Debug, Clone)]
pub struct FileHeaders {
    pub content_type: &'static str,
    pub last_modified: Option<String>,
    pub accept_ranges: bool,
}

/// Build 200/206 file response
///
/// `content_length` is the length of the byte span the body carries (or would
/// carry, for HEAD).
pub fn build_file_response(
    status: StatusCode,
    headers: &FileHeaders,
    content_length: u64,
    content_range: Option<String>,
    body: FsBody,
) -> Response<FsBody> {
    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, headers.content_type)
        .header(header::CONTENT_LENGTH, content_length);

    if let Some(ref lm) = headers.last_modified {
        builder = builder.header(header::LAST_MODIFIED, lm);
    }
    if headers.accept_ranges {
        builder = builder.header(header::ACCEPT_RANGES, "bytes");
    }
    if let Some(range) = content_range {
        builder = builder.header(header::CONTENT_RANGE, range);
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error(status.as_str(), &e);
        fallback(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

/// Build 304 Not Modified response
pub fn build_304_response(last_modified: Option<&str>) -> Response<FsBody> {
    let mut builder = Response::builder().status(StatusCode::NOT_MODIFIED);
    if let Some(lm) = last_modified {
        builder = builder.header(header::LAST_MODIFIED, lm);
    }
    builder.body(empty_body()).unwrap_or_else(|e| {
        log_build_error("304", &e);
        fallback(StatusCode::NOT_MODIFIED)
    })
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(file_size: u64, headers: &FileHeaders) -> Response<FsBody> {
    let mut builder = Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(header::CONTENT_RANGE, format!("bytes */{file_size}"))
        .header(header::CONTENT_LENGTH, 0u64);
    if let Some(ref lm) = headers.last_modified {
        builder = builder.header(header::LAST_MODIFIED, lm);
    }
    builder.body(empty_body()).unwrap_or_else(|e| {
        log_build_error("416", &e);
        fallback(StatusCode::RANGE_NOT_SATISFIABLE)
    })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<FsBody> {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 403 Forbidden response
pub fn build_403_response() -> Response<FsBody> {
    build_text_response(StatusCode::FORBIDDEN, "403 Forbidden")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<FsBody> {
    let mut resp = build_text_response(StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed");
    resp.headers_mut()
        .insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
    resp
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<FsBody> {
    build_text_response(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error")
}

/// Build generic HTML response (directory listings)
pub fn build_html_response(content: String, is_head: bool) -> Response<FsBody> {
    let content_length = content.len();
    let body = if is_head {
        empty_body()
    } else {
        full_body(content)
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, HTML_CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, content_length)
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            fallback(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

fn build_text_response(status: StatusCode, text: &'static str) -> Response<FsBody> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(header::CONTENT_LENGTH, text.len())
        .body(full_body(text))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            fallback(status)
        })
}

fn fallback(status: StatusCode) -> Response<FsBody> {
    let mut resp = Response::new(empty_body());
    *resp.status_mut() = status;
    resp
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

/// `Content-Length` as declared on a response, 0 when absent or unparseable
pub fn declared_content_length<B>(resp: &Response<B>) -> u64 {
    resp.headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}
