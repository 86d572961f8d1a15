//! HTTP protocol layer module
//!
//! Range parsing, response bodies and builders, and the range-aware file
//! responder. Nothing in here knows about routing or configuration.

pub mod body;
pub mod mime;
pub mod range;
pub mod responder;
pub mod response;

// Re-export commonly used types
pub use body::ResponseBody;
pub use range::{ByteRange, RangeError};
pub use responder::{FileSource, FileStat, LocalFs, RangeFileResponder};
pub use response::{
    build_404_response, build_405_response, build_500_response, build_health_response,
    build_options_response,
};
