//! Request handler module
//!
//! Path resolution, directory listings and file responses for the file
//! listener.

pub mod listing;
pub mod resolve;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
