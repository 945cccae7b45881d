//! HTTP protocol layer module
//!
//! Header parsing, the conditional/range decision table and response builders,
//! decoupled from filesystem access.

pub mod conditional;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use conditional::{evaluate, Preconditions, ResponseShape};
pub use range::parse_range_header;
pub use response::{
    build_304_response, build_403_response, build_404_response, build_405_response, build_416_response,
    build_500_response, FsBody,
};
