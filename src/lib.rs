//! `fsd`: a static file server.
//!
//! Serves a directory tree over HTTP/1.1 with index-file fallback, generated
//! directory listings, `If-Modified-Since` revalidation and single byte
//! ranges. Every file request is classified into outcome counters that a
//! separate stats listener exposes as JSON.

pub mod api;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
pub mod stats;
