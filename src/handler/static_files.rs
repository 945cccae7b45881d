//! Static file serving module
//!
//! Turns a resolved target into a response: directory listings, conditional
//! GET, byte ranges and streamed file bodies.

use hyper::{Response, StatusCode};
use std::io::SeekFrom;
use tokio::fs::File;
use tokio::io::AsyncSeekExt;

use super::listing;
use super::resolve::{resolve, Resolution, ResolvedTarget};
use crate::config::AppState;
use crate::error::ServeError;
use crate::handler::router::RequestContext;
use crate::http::conditional::format_last_modified;
use crate::http::response::{self as resp, FileHeaders};
use crate::http::{self, evaluate, FsBody, Preconditions, ResponseShape};
use crate::logger;

/// Serve a request path from the root directory
pub async fn serve(ctx: &RequestContext<'_>, state: &AppState) -> Response<FsBody> {
    match resolve(&state.root, ctx.path, state.fs()).await {
        Ok(Resolution::File(target)) => serve_file(ctx, &target, state.fs().byte_range)
            .await
            .unwrap_or_else(|e| error_response(&e)),
        Ok(Resolution::Listing(target)) => match listing::generate_listing(&target).await {
            Ok(html) => resp::build_html_response(html, ctx.is_head),
            Err(e) => error_response(&e),
        },
        Err(e) => error_response(&e),
    }
}

/// Serve a regular file, honoring `If-Modified-Since` and `Range`
pub async fn serve_file(
    ctx: &RequestContext<'_>,
    target: &ResolvedTarget,
    byte_range: bool,
) -> Result<Response<FsBody>, ServeError> {
    let headers = FileHeaders {
        content_type: http::mime::content_type_for(&target.path),
        last_modified: target.modified.map(format_last_modified),
        accept_ranges: byte_range,
    };

    let shape = evaluate(
        target.size,
        target.modified,
        Preconditions {
            if_modified_since: ctx.if_modified_since,
            range: ctx.range_header,
        },
        byte_range,
    );

    let response = match shape {
        ResponseShape::NotModified => http::build_304_response(headers.last_modified.as_deref()),
        ResponseShape::NotSatisfiable => http::build_416_response(target.size, &headers),
        ResponseShape::Full => {
            let body = open_body(target, 0, target.size, ctx.is_head).await?;
            resp::build_file_response(StatusCode::OK, &headers, target.size, None, body)
        }
        ResponseShape::Partial { start, end } => {
            let len = end - start + 1;
            let body = open_body(target, start, len, ctx.is_head).await?;
            resp::build_file_response(
                StatusCode::PARTIAL_CONTENT,
                &headers,
                len,
                Some(format!("bytes {start}-{end}/{}", target.size)),
                body,
            )
        }
    };
    Ok(response)
}

/// Open the file positioned at `start`, streaming `len` bytes; HEAD skips the open
async fn open_body(
    target: &ResolvedTarget,
    start: u64,
    len: u64,
    is_head: bool,
) -> Result<FsBody, ServeError> {
    if is_head {
        return Ok(resp::empty_body());
    }
    let mut file = File::open(&target.path).await?;
    if start > 0 {
        file.seek(SeekFrom::Start(start)).await?;
    }
    Ok(resp::file_body(file, len))
}

/// Map a serve error onto a response without leaking details to the client
fn error_response(err: &ServeError) -> Response<FsBody> {
    match err.status() {
        StatusCode::NOT_FOUND => http::build_404_response(),
        StatusCode::FORBIDDEN => {
            logger::log_warning(&format!("Access denied: {err}"));
            http::build_403_response()
        }
        _ => {
            logger::log_error(&format!("Failed to serve request: {err}"));
            http::build_500_response()
        }
    }
}
