//! Response body types
//!
//! Every response carries a [`ResponseBody`]: either a small in-memory
//! payload or a file read lazily as the connection drains it. Dropping the
//! body drops the underlying reader, which releases the file handle.

use futures_util::TryStreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use std::io;
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

/// Boxed body shared by all handlers
pub type ResponseBody = UnsyncBoxBody<Bytes, io::Error>;

/// In-memory body
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Zero-length body (HEAD, 204)
pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Streaming body over an async reader
pub fn from_reader<R>(reader: R) -> ResponseBody
where
    R: AsyncRead + Send + 'static,
{
    let stream = ReaderStream::new(reader).map_ok(Frame::data);
    StreamBody::new(stream).boxed_unsync()
}
