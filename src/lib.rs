//! Single-range file server
//!
//! Serves files over HTTP/1.1 honoring one `Range: bytes=start-end` request
//! header per response (RFC 7233). The core lives in [`http::responder`];
//! the remaining modules wire it into a configurable server.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
