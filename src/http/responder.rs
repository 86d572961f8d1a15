//! Range-aware file responder
//!
//! Turns a file path plus an optional `Range` header into a complete
//! response: 200 with the whole file, 206 with a single byte range, or a
//! 400/416 rejection. Filesystem access goes through [`FileSource`] so the
//! responder never depends on where bytes come from.

use super::body;
use super::body::ResponseBody;
use super::mime;
use super::range::{self, ByteRange, RangeError};
use super::response;
use hyper::Response;
use std::io::{self, SeekFrom};
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt};

/// Result of a single stat call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub total_size: u64,
}

/// Filesystem primitives the responder needs
#[allow(async_fn_in_trait)]
pub trait FileSource {
    /// Reader handed to the response body
    type Reader: AsyncRead + Send + 'static;

    /// Fetch the size of the file at `path`
    async fn stat(&self, path: &Path) -> io::Result<FileStat>;

    /// Open `path` for reading, limited to `range` when given
    async fn open(&self, path: &Path, range: Option<ByteRange>) -> io::Result<Self::Reader>;
}

/// [`FileSource`] backed by the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileSource for LocalFs {
    type Reader = tokio::io::Take<File>;

    async fn stat(&self, path: &Path) -> io::Result<FileStat> {
        let metadata = fs::metadata(path).await?;
        Ok(FileStat {
            total_size: metadata.len(),
        })
    }

    async fn open(&self, path: &Path, range: Option<ByteRange>) -> io::Result<Self::Reader> {
        let mut file = File::open(path).await?;
        match range {
            Some(range) => {
                file.seek(SeekFrom::Start(range.start)).await?;
                Ok(file.take(range.len()))
            }
            None => Ok(file.take(u64::MAX)),
        }
    }
}

/// Outcome of resolving a request before any response is built
#[derive(Debug)]
pub enum RangedFile<R> {
    /// No `Range` header: the whole file
    Full { reader: R },
    /// A single satisfiable range
    Partial {
        reader: R,
        range: ByteRange,
        total_size: u64,
    },
}

/// Serves files with single byte-range support
///
/// Holds no per-request state; one instance is shared by every connection.
#[derive(Debug, Clone, Default)]
pub struct RangeFileResponder<F = LocalFs> {
    fs: F,
}

impl<F: FileSource> RangeFileResponder<F> {
    pub const fn new(fs: F) -> Self {
        Self { fs }
    }

    /// Resolve the request into a reader without building a response
    ///
    /// Outer `Err` is a filesystem failure, inner `Err` a rejected range.
    /// Syntax errors are reported before the file is stat'ed, and no reader
    /// is opened for any rejected range.
    pub async fn resolve(
        &self,
        path: &Path,
        range_header: Option<&str>,
    ) -> io::Result<Result<RangedFile<F::Reader>, RangeError>> {
        let Some(header) = range_header else {
            let reader = self.fs.open(path, None).await?;
            return Ok(Ok(RangedFile::Full { reader }));
        };

        let spec = match range::parse_range_spec(header) {
            Ok(spec) => spec,
            Err(err) => return Ok(Err(err)),
        };

        let FileStat { total_size } = self.fs.stat(path).await?;
        let range = match spec.resolve(total_size) {
            Ok(range) => range,
            Err(err) => return Ok(Err(err)),
        };

        let reader = self.fs.open(path, Some(range)).await?;
        Ok(Ok(RangedFile::Partial {
            reader,
            range,
            total_size,
        }))
    }

    /// Build the complete response for `path`
    ///
    /// Range failures become 400/416 responses here; only filesystem errors
    /// are returned to the caller.
    pub async fn respond(
        &self,
        path: &Path,
        range_header: Option<&str>,
    ) -> io::Result<Response<ResponseBody>> {
        let content_type = mime::content_type_for(path);

        let resp = match self.resolve(path, range_header).await? {
            Ok(RangedFile::Full { reader }) => {
                response::build_file_response(body::from_reader(reader), content_type)
            }
            Ok(RangedFile::Partial {
                reader,
                range,
                total_size,
            }) => {
                crate::logger::log_debug(&format!(
                    "[Range] {} {}",
                    path.display(),
                    range.content_range(total_size)
                ));
                response::build_partial_response(
                    body::from_reader(reader),
                    content_type,
                    range,
                    total_size,
                )
            }
            Err(err) => {
                crate::logger::log_debug(&format!(
                    "[Range] {} rejected {:?}: {err}",
                    path.display(),
                    range_header.unwrap_or_default()
                ));
                response::build_range_error_response(err)
            }
        };

        Ok(resp)
    }
}
