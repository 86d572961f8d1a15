//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, route
//! matching and dispatch.

use crate::config::{AppState, RoutesConfig};
use crate::handler::static_files;
use crate::http::{self, body, RangeError, ResponseBody};
use crate::logger::{self, AccessLogEntry};
use hyper::header::{HeaderValue, CONTENT_LENGTH, RANGE, REFERER, SERVER, USER_AGENT};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    /// `Err` when the header is present but not visible ASCII
    pub range_header: Result<Option<&'a str>, RangeError>,
}

/// Main entry point for HTTP request handling
///
/// Generic over the request body: only the head of the request is read.
pub async fn handle_request<B>(
    req: Request<B>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    let method = req.method();
    let is_head = *method == Method::HEAD;

    let ctx = RequestContext {
        path: req.uri().path(),
        is_head,
        range_header: range_header(&req),
    };

    // 1. Check HTTP method, then dispatch
    let mut response = match check_http_method(method, state.config.http.enable_cors) {
        Some(resp) => resp,
        None => route_request(&ctx, &state.config.routes, &state).await,
    };

    // 2. HEAD: same head as GET, the file is released without being read
    if is_head {
        *response.body_mut() = body::empty();
    }

    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server);
    }

    // 3. Access log
    if state.access_log_enabled() {
        let entry = build_access_entry(&req, peer_addr, &response, started);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<ResponseBody>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Route request based on path and configuration
async fn route_request(
    ctx: &RequestContext<'_>,
    routes: &RoutesConfig,
    state: &AppState,
) -> Response<ResponseBody> {
    // 1. Health check endpoint
    if routes.health.enabled && ctx.path == routes.health.path {
        return http::build_health_response("ok");
    }

    // 2. Exact file routes
    if let Some(route) = routes.files.iter().find(|r| r.path == ctx.path) {
        return static_files::serve_file(ctx, &state.responder, Path::new(&route.file)).await;
    }

    // 3. Directory routes, longest prefix wins
    let dir_route = routes
        .dirs
        .iter()
        .filter(|r| static_files::strip_route_prefix(ctx.path, &r.prefix).is_some())
        .max_by_key(|r| r.prefix.trim_end_matches('/').len());
    if let Some(route) = dir_route {
        return static_files::serve_directory(ctx, &state.responder, &route.dir, &route.prefix)
            .await;
    }

    http::build_404_response()
}

fn header_str<B>(req: &Request<B>, name: hyper::header::HeaderName) -> Option<&str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

fn range_header<B>(req: &Request<B>) -> Result<Option<&str>, RangeError> {
    req.headers()
        .get(RANGE)
        .map(|v| v.to_str().map_err(|_| RangeError::MalformedRange))
        .transpose()
}

fn build_access_entry<B>(
    req: &Request<B>,
    peer_addr: SocketAddr,
    response: &Response<ResponseBody>,
    started: Instant,
) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = match req.version() {
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        _ => "1.1",
    }
    .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    entry.range = header_str(req, RANGE).map(ToString::to_string);
    entry.referer = header_str(req, REFERER).map(ToString::to_string);
    entry.user_agent = header_str(req, USER_AGENT).map(ToString::to_string);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}
