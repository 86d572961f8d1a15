//! Static file serving module
//!
//! Maps routes onto paths on disk and hands them to the range responder.
//! Filesystem errors the responder propagates are translated here.

use crate::handler::router::RequestContext;
use crate::http::{self, FileSource, RangeFileResponder, ResponseBody};
use crate::logger;
use hyper::Response;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Serve a single file
pub async fn serve_file<F: FileSource>(
    ctx: &RequestContext<'_>,
    responder: &RangeFileResponder<F>,
    file_path: &Path,
) -> Response<ResponseBody> {
    let range_header = match ctx.range_header {
        Ok(header) => header,
        Err(err) => return http::response::build_range_error_response(err),
    };
    match responder.respond(file_path, range_header).await {
        Ok(resp) => resp,
        Err(e) => io_error_response(&e, file_path),
    }
}

/// Serve a file below `dir`, addressed by the URL remainder after `route_prefix`
pub async fn serve_directory<F: FileSource>(
    ctx: &RequestContext<'_>,
    responder: &RangeFileResponder<F>,
    dir: &str,
    route_prefix: &str,
) -> Response<ResponseBody> {
    match resolve_in_directory(dir, ctx.path, route_prefix).await {
        Some(file_path) => serve_file(ctx, responder, &file_path).await,
        None => http::build_404_response(),
    }
}

/// Strip a route prefix on a path segment boundary
///
/// Returns the remainder without its leading slash.
pub fn strip_route_prefix<'a>(path: &'a str, route_prefix: &str) -> Option<&'a str> {
    let prefix = route_prefix.trim_end_matches('/');
    let rest = path.strip_prefix(prefix)?;
    if !rest.is_empty() && !rest.starts_with('/') {
        // "/media" must not match "/mediafoo"
        return None;
    }
    Some(rest.trim_start_matches('/'))
}

/// Resolve a request path to a regular file inside `dir`
///
/// Rejects anything that canonicalizes outside `dir` (`..`, symlinks) and
/// anything that is not a regular file. Directories are never listed.
pub async fn resolve_in_directory(dir: &str, path: &str, route_prefix: &str) -> Option<PathBuf> {
    let relative = strip_route_prefix(path, route_prefix)?;
    if relative.is_empty() {
        return None;
    }

    let Ok(relative) = urlencoding::decode(relative) else {
        logger::log_warning(&format!("Rejected non UTF-8 path: {path}"));
        return None;
    };

    let dir_canonical = match fs::canonicalize(dir).await {
        Ok(p) => p,
        Err(e) => {
            logger::log_warning(&format!(
                "Static directory not found or inaccessible '{dir}': {e}"
            ));
            return None;
        }
    };

    // File not found is common (404), no need to log at warning level
    let file_canonical = fs::canonicalize(dir_canonical.join(&*relative))
        .await
        .ok()?;
    if !file_canonical.starts_with(&dir_canonical) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            path,
            file_canonical.display()
        ));
        return None;
    }

    let metadata = fs::metadata(&file_canonical).await.ok()?;
    metadata.is_file().then_some(file_canonical)
}

/// Generic filesystem error translation
fn io_error_response(err: &io::Error, file_path: &Path) -> Response<ResponseBody> {
    match err.kind() {
        io::ErrorKind::NotFound => http::build_404_response(),
        _ => {
            logger::log_error(&format!(
                "Failed to serve file '{}': {err}",
                file_path.display()
            ));
            http::build_500_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_route_prefix() {
        assert_eq!(strip_route_prefix("/media/a.mp4", "/media"), Some("a.mp4"));
        assert_eq!(strip_route_prefix("/media/a.mp4", "/media/"), Some("a.mp4"));
        assert_eq!(strip_route_prefix("/media", "/media"), Some(""));
        assert_eq!(strip_route_prefix("/mediafoo/a", "/media"), None);
        assert_eq!(strip_route_prefix("/a/b", "/"), Some("a/b"));
        assert_eq!(strip_route_prefix("/other", "/media"), None);
    }

    #[tokio::test]
    async fn test_resolve_in_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("public");
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        std::fs::write(dir.join("sub/my clip.mp4"), b"data").unwrap();
        std::fs::write(root.path().join("secret.txt"), b"secret").unwrap();
        let dir_str = dir.to_str().unwrap();

        let found = resolve_in_directory(dir_str, "/files/sub/my%20clip.mp4", "/files")
            .await
            .unwrap();
        assert!(found.ends_with("sub/my clip.mp4"));

        // Traversal out of the directory
        assert!(resolve_in_directory(dir_str, "/files/../secret.txt", "/files")
            .await
            .is_none());
        assert!(resolve_in_directory(dir_str, "/files/%2e%2e/secret.txt", "/files")
            .await
            .is_none());
        // Directories are not served
        assert!(resolve_in_directory(dir_str, "/files/sub", "/files")
            .await
            .is_none());
        assert!(resolve_in_directory(dir_str, "/files/", "/files")
            .await
            .is_none());
        // Missing file
        assert!(resolve_in_directory(dir_str, "/files/nope.mp4", "/files")
            .await
            .is_none());
    }

    #[test]
    fn test_io_error_mapping() {
        let path = Path::new("x");
        let resp = io_error_response(&io::Error::from(io::ErrorKind::NotFound), path);
        assert_eq!(resp.status(), hyper::StatusCode::NOT_FOUND);
        let resp = io_error_response(&io::Error::from(io::ErrorKind::PermissionDenied), path);
        assert_eq!(resp.status(), hyper::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
