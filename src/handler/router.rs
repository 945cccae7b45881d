//! Request dispatch module
//!
//! Entry point for file requests: method validation, file serving, outcome
//! classification and access logging.

use hyper::header::{self, HeaderValue};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppState;
use crate::handler::static_files;
use crate::http::{self, response::declared_content_length, FsBody};
use crate::logger::{self, AccessLogEntry};
use crate::stats::OutcomeGuard;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_modified_since: Option<&'a str>,
    pub range_header: Option<&'a str>,
}

impl<'a> RequestContext<'a> {
    pub fn from_parts(req: &'a Parts) -> Self {
        let header_str = move |name: header::HeaderName| {
            req.headers.get(name).and_then(|v| v.to_str().ok())
        };
        Self {
            path: req.uri.path(),
            is_head: req.method == Method::HEAD,
            if_modified_since: header_str(header::IF_MODIFIED_SINCE),
            range_header: header_str(header::RANGE),
        }
    }
}

/// Main entry point for file requests.
///
/// The request is counted exactly once: on completion here, or by the guard's
/// `Drop` if hyper abandons this future because the client went away.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<FsBody>, Infallible> {
    let started = Instant::now();
    let guard = OutcomeGuard::new(Arc::clone(&state.counters));
    // Request bodies are never read
    let (req, _) = req.into_parts();

    let mut response = match check_http_method(&req.method) {
        Some(resp) => resp,
        None => {
            let ctx = RequestContext::from_parts(&req);
            static_files::serve(&ctx, &state).await
        }
    };

    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(header::SERVER, server);
    }

    let content_length = declared_content_length(&response);
    guard.finish(response.status(), content_length);

    if state.config.logging.access_log {
        log_access(&req, &response, &state, peer_addr, content_length, started);
    }

    Ok(response)
}

/// Only GET and HEAD are served; everything else gets 405
fn check_http_method(method: &Method) -> Option<Response<FsBody>> {
    match *method {
        Method::GET | Method::HEAD => None,
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

fn log_access(
    req: &Parts,
    response: &Response<FsBody>,
    state: &AppState,
    peer_addr: SocketAddr,
    content_length: u64,
    started: Instant,
) {
    let header_string = |name: header::HeaderName| {
        req.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method.to_string(),
        req.uri.path().to_string(),
    );
    entry.query = req.uri.query().map(ToString::to_string);
    entry.http_version = version_str(req.version).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = if req.method == Method::HEAD {
        0
    } else {
        content_length
    };
    entry.referer = header_string(header::REFERER);
    entry.user_agent = header_string(header::USER_AGENT);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.access_log_format);
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
