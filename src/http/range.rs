//! HTTP Range request parsing module
//!
//! Single byte-range parsing for partial content responses (RFC 7233).
//!
//! Parsing happens in two steps so that syntax errors are reported before
//! the file is ever touched:
//! 1. [`parse_range_spec`] splits the raw header into start/end tokens.
//! 2. [`RangeSpec::resolve`] turns the tokens into a [`ByteRange`] once the
//!    total file size is known.

use hyper::StatusCode;
use thiserror::Error;

/// Range request failure, each variant maps to exactly one response
///
/// The `Display` text is used verbatim as the response body.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RangeError {
    /// More than one range was requested (`bytes=0-5,10-15`)
    #[error("multi-range not supported")]
    UnsupportedMultiRange,
    /// The range specification is empty (`bytes=`)
    #[error("bad range")]
    MalformedRange,
    /// The requested bounds fall outside the file
    #[error("Requested Range Not Satisfiable")]
    NotSatisfiable { total_size: u64 },
}

impl RangeError {
    /// HTTP status for this failure
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::UnsupportedMultiRange | Self::MalformedRange => StatusCode::BAD_REQUEST,
            Self::NotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
        }
    }
}

/// Inclusive byte range within a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset
    pub start: u64,
    /// Last byte offset (inclusive)
    pub end: u64,
}

#[allow(clippy::len_without_is_empty)]
impl ByteRange {
    /// Number of bytes covered by the range
    #[inline]
    pub const fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Content-Range` value for a 206 response
    pub fn content_range(&self, total_size: u64) -> String {
        format!("bytes {}-{}/{total_size}", self.start, self.end)
    }
}

/// Syntactically valid single range, not yet checked against a file size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec<'a> {
    start: &'a str,
    end: Option<&'a str>,
}

/// Parse the raw `Range` header value into start/end tokens
///
/// The unit before `=` is not inspected. Only the specification after the
/// first `=` matters.
///
/// # Examples
/// ```
/// use rangeserve::http::range::{parse_range_spec, RangeError};
///
/// let spec = parse_range_spec("bytes=0-99").unwrap();
/// assert_eq!(spec.resolve(1000).unwrap().len(), 100);
///
/// assert_eq!(
///     parse_range_spec("bytes=0-9,20-29"),
///     Err(RangeError::UnsupportedMultiRange)
/// );
/// assert_eq!(parse_range_spec("bytes="), Err(RangeError::MalformedRange));
/// ```
pub fn parse_range_spec(header: &str) -> Result<RangeSpec<'_>, RangeError> {
    let Some((_unit, spec)) = header.split_once('=') else {
        return Err(RangeError::MalformedRange);
    };

    if spec.contains(',') {
        return Err(RangeError::UnsupportedMultiRange);
    }

    let spec = spec.trim();
    if spec.is_empty() {
        return Err(RangeError::MalformedRange);
    }

    // Tokens after the second are ignored: `10-20-30` is `10-20`
    let mut tokens = spec.split('-');
    let start = tokens.next().unwrap_or_default().trim();
    let end = tokens.next().map(str::trim);

    Ok(RangeSpec { start, end })
}

impl RangeSpec<'_> {
    /// Resolve the tokens against the total file size
    ///
    /// A missing or non-numeric start falls back to 0, a missing or
    /// non-numeric end falls back to the last byte of the file.
    pub fn resolve(&self, total_size: u64) -> Result<ByteRange, RangeError> {
        let not_satisfiable = RangeError::NotSatisfiable { total_size };

        // Empty file: no offset is addressable
        let max = total_size.checked_sub(1).ok_or(not_satisfiable)?;

        let start = self.start.parse::<u64>().unwrap_or(0);
        let end = self
            .end
            .and_then(|e| e.parse::<u64>().ok())
            .unwrap_or(max);

        if end > max || start > max || start > end {
            return Err(not_satisfiable);
        }

        Ok(ByteRange { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(header: &str, total_size: u64) -> Result<ByteRange, RangeError> {
        parse_range_spec(header)?.resolve(total_size)
    }

    #[test]
    fn test_standard_range() {
        let range = resolve("bytes=0-9", 100).unwrap();
        assert_eq!(range, ByteRange { start: 0, end: 9 });
        assert_eq!(range.len(), 10);
        assert_eq!(range.content_range(100), "bytes 0-9/100");
    }

    #[test]
    fn test_open_range() {
        let range = resolve("bytes=50-", 100).unwrap();
        assert_eq!(range, ByteRange { start: 50, end: 99 });
        assert_eq!(range.len(), 50);
    }

    #[test]
    fn test_open_range_from_zero_covers_file() {
        let range = resolve("bytes=0-", 10).unwrap();
        assert_eq!(range.content_range(10), "bytes 0-9/10");
    }

    #[test]
    fn test_single_byte_at_end() {
        let range = resolve("bytes=99-99", 100).unwrap();
        assert_eq!(range.len(), 1);
    }

    #[test]
    fn test_invalid_start_defaults_to_zero() {
        assert_eq!(
            resolve("bytes=abc-9", 100).unwrap(),
            ByteRange { start: 0, end: 9 }
        );
        // Suffix form is not special cased: missing start is 0
        assert_eq!(
            resolve("bytes=-20", 100).unwrap(),
            ByteRange { start: 0, end: 20 }
        );
    }

    #[test]
    fn test_invalid_end_defaults_to_max() {
        assert_eq!(
            resolve("bytes=10-xyz", 100).unwrap(),
            ByteRange { start: 10, end: 99 }
        );
    }

    #[test]
    fn test_extra_dash_tokens_are_ignored() {
        assert_eq!(
            resolve("bytes=10-20-30", 100).unwrap(),
            ByteRange { start: 10, end: 20 }
        );
        assert_eq!(
            resolve("bytes=10--30", 100).unwrap(),
            ByteRange { start: 10, end: 99 }
        );
    }

    #[test]
    fn test_not_satisfiable() {
        let err = resolve("bytes=100-110", 100).unwrap_err();
        assert_eq!(err, RangeError::NotSatisfiable { total_size: 100 });
        assert_eq!(err.status(), StatusCode::RANGE_NOT_SATISFIABLE);

        assert!(matches!(
            resolve("bytes=0-100", 100),
            Err(RangeError::NotSatisfiable { .. })
        ));
        assert!(matches!(
            resolve("bytes=200-", 100),
            Err(RangeError::NotSatisfiable { .. })
        ));
        assert!(matches!(
            resolve("bytes=50-10", 100),
            Err(RangeError::NotSatisfiable { .. })
        ));
    }

    #[test]
    fn test_empty_file_not_satisfiable() {
        assert_eq!(
            resolve("bytes=0-", 0),
            Err(RangeError::NotSatisfiable { total_size: 0 })
        );
    }

    #[test]
    fn test_multi_range_rejected() {
        let err = parse_range_spec("bytes=0-5,10-15").unwrap_err();
        assert_eq!(err, RangeError::UnsupportedMultiRange);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "multi-range not supported");
    }

    #[test]
    fn test_malformed() {
        assert_eq!(parse_range_spec("bytes="), Err(RangeError::MalformedRange));
        assert_eq!(parse_range_spec("bytes=  "), Err(RangeError::MalformedRange));
        assert_eq!(parse_range_spec("bytes"), Err(RangeError::MalformedRange));
        assert_eq!(RangeError::MalformedRange.to_string(), "bad range");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            RangeError::NotSatisfiable { total_size: 5 }.to_string(),
            "Requested Range Not Satisfiable"
        );
    }
}
