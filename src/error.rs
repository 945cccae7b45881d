//! Error types for request handling
//!
//! None of these escape the request handler: each one is turned into a status
//! code (404, 403 or 500) with a fixed body.

use hyper::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServeError {
    /// Request path tried to leave the root directory
    #[error("path escapes root: {0}")]
    Traversal(String),

    /// Nothing servable at the requested path
    #[error("not found")]
    NotFound,

    /// Listing a directory failed
    #[error("failed to read directory: {0}")]
    DirectoryRead(#[source] std::io::Error),

    /// Opening or reading a file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServeError {
    /// Status code sent to the client for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Traversal(_) | Self::NotFound => StatusCode::NOT_FOUND,
            Self::DirectoryRead(e) | Self::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => StatusCode::NOT_FOUND,
                std::io::ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}
