//! Request handler module
//!
//! Method checks, route matching and static file dispatch.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
