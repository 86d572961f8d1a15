//! HTTP response building module
//!
//! Builders for every status the server emits. Builders never fail: a
//! rejected header value is logged and a bare response is returned instead.

use super::body::{self, ResponseBody};
use super::range::{ByteRange, RangeError};
use hyper::header::{ACCEPT_RANGES, ALLOW, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE};
use hyper::{Response, StatusCode};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Build 200 OK response streaming a whole file
pub fn build_file_response(body: ResponseBody, content_type: &str) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(ACCEPT_RANGES, "bytes")
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(body::empty())
        })
}

/// Build 206 Partial Content response
pub fn build_partial_response(
    body: ResponseBody,
    content_type: &str,
    range: ByteRange,
    total_size: u64,
) -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::PARTIAL_CONTENT)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, range.len())
        .header(CONTENT_RANGE, range.content_range(total_size))
        .header(ACCEPT_RANGES, "bytes")
        .body(body)
        .unwrap_or_else(|e| {
            log_build_error("206", &e);
            Response::new(body::empty())
        })
}

/// Build 400/416 response for a rejected `Range` header
///
/// The unsatisfiable form of `Content-Range` carries only the total size:
/// `bytes <total>`.
pub fn build_range_error_response(err: RangeError) -> Response<ResponseBody> {
    let message = err.to_string();
    let mut builder = Response::builder()
        .status(err.status())
        .header(CONTENT_TYPE, TEXT_PLAIN)
        .header(ACCEPT_RANGES, "bytes");

    if let RangeError::NotSatisfiable { total_size } = err {
        builder = builder.header(CONTENT_RANGE, format!("bytes {total_size}"));
    }

    builder.body(body::full(message)).unwrap_or_else(|e| {
        log_build_error(err.status().as_str(), &e);
        Response::new(body::empty())
    })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found")
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    let mut resp = build_text_response(StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed");
    resp.headers_mut()
        .insert(ALLOW, hyper::header::HeaderValue::from_static(ALLOWED_METHODS));
    resp
}

/// Build health check response
pub fn build_health_response(status: &'static str) -> Response<ResponseBody> {
    build_text_response(StatusCode::OK, status)
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(enable_cors: bool) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(ALLOW, ALLOWED_METHODS)
        .header(ACCEPT_RANGES, "bytes");

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", ALLOWED_METHODS)
            .header("Access-Control-Allow-Headers", "Range")
            .header(
                "Access-Control-Expose-Headers",
                "Accept-Ranges, Content-Range, Content-Length",
            )
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(body::empty()).unwrap_or_else(|e| {
        log_build_error("OPTIONS", &e);
        Response::new(body::empty())
    })
}

fn build_text_response(status: StatusCode, text: &'static str) -> Response<ResponseBody> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, TEXT_PLAIN)
        .header(CONTENT_LENGTH, text.len())
        .body(body::full(text))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(body::full(text))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_text(resp: Response<ResponseBody>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_unsatisfiable_response() {
        let resp = build_range_error_response(RangeError::NotSatisfiable { total_size: 42 });
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(resp.headers()[CONTENT_RANGE], "bytes 42");
        assert_eq!(resp.headers()[ACCEPT_RANGES], "bytes");
        assert_eq!(body_text(resp).await, "Requested Range Not Satisfiable");
    }

    #[tokio::test]
    async fn test_bad_request_responses() {
        let resp = build_range_error_response(RangeError::UnsupportedMultiRange);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(resp.headers().get(CONTENT_RANGE).is_none());
        assert_eq!(body_text(resp).await, "multi-range not supported");

        let resp = build_range_error_response(RangeError::MalformedRange);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(resp).await, "bad range");
    }

    #[test]
    fn test_partial_headers() {
        let range = ByteRange { start: 10, end: 19 };
        let resp = build_partial_response(body::empty(), "video/mp4", range, 100);
        assert_eq!(resp.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(resp.headers()[CONTENT_RANGE], "bytes 10-19/100");
        assert_eq!(resp.headers()[CONTENT_LENGTH], "10");
        assert_eq!(resp.headers()[CONTENT_TYPE], "video/mp4");
    }

    #[test]
    fn test_options_cors() {
        let resp = build_options_response(true);
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");

        let resp = build_options_response(false);
        assert!(resp.headers().get("access-control-allow-origin").is_none());
    }

    #[test]
    fn test_405_allow_header() {
        let resp = build_405_response();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()[ALLOW], ALLOWED_METHODS);
    }
}
