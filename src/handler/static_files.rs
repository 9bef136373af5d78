//! Static asset serving module
//!
//! Resolves request paths inside the configured site root and builds file
//! responses with cache validators and Range support. The filesystem is
//! treated as a read-only key-value store; nothing is ever written.

use crate::config::SiteConfig;
use crate::handler::router::RequestContext;
use crate::http::{self, cache, mime, range::RangeParseResult};
use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Index document looked up when a directory is requested
const INDEX_DOCUMENT: &str = "index.html";

/// Why an asset could not be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeError {
    /// Missing file, directory without an index, or a path escaping the root
    NotFound,
    /// Filesystem permission denial
    Forbidden,
}

impl ServeError {
    fn into_response(self) -> Response<Full<Bytes>> {
        match self {
            Self::NotFound => http::build_404_response(),
            Self::Forbidden => http::build_403_response(),
        }
    }
}

/// Serve the configured root document for `/`.
pub async fn serve_root_document(
    ctx: &RequestContext<'_>,
    site: &SiteConfig,
) -> Response<Full<Bytes>> {
    let path = Path::new(&site.root_dir).join(&site.root_document);
    match read_with_content_type(&path).await {
        Ok((content, content_type)) => build_asset_response(&content, content_type, ctx),
        Err(e) => e.into_response(),
    }
}

/// Serve an asset resolved under the site root.
pub async fn serve_asset(
    ctx: &RequestContext<'_>,
    root_dir: &str,
    rest: &str,
) -> Response<Full<Bytes>> {
    match load_from_root(root_dir, rest).await {
        Ok((content, content_type)) => build_asset_response(&content, content_type, ctx),
        Err(e) => e.into_response(),
    }
}

/// Resolve a request path to a file inside `root_dir`.
///
/// `..` segments are dropped up front, and the canonicalized result is
/// re-checked against the canonical root, so neither crafted paths nor
/// symlinks can reach outside the served tree. Directory paths fall through
/// to the directory's index document.
pub fn resolve_asset_path(root_dir: &str, request_path: &str) -> Result<PathBuf, ServeError> {
    let clean = request_path.trim_start_matches('/').replace("..", "");

    let root = Path::new(root_dir).canonicalize().map_err(|e| {
        logger::log_warning(&format!(
            "Site root '{root_dir}' not found or inaccessible: {e}"
        ));
        ServeError::NotFound
    })?;

    let mut file_path = Path::new(root_dir).join(&clean);
    if clean.is_empty() || clean.ends_with('/') || file_path.is_dir() {
        file_path = file_path.join(INDEX_DOCUMENT);
    }

    // Missing files are the common 404 case, not worth a log line
    let resolved = file_path
        .canonicalize()
        .map_err(|e| serve_error_from_io(&e))?;
    if !resolved.starts_with(&root) {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            request_path,
            resolved.display()
        ));
        return Err(ServeError::NotFound);
    }

    Ok(resolved)
}

/// Resolve and read an asset under the root directory.
pub async fn load_from_root(
    root_dir: &str,
    request_path: &str,
) -> Result<(Vec<u8>, &'static str), ServeError> {
    let path = resolve_asset_path(root_dir, request_path)?;
    read_with_content_type(&path).await
}

async fn read_with_content_type(path: &Path) -> Result<(Vec<u8>, &'static str), ServeError> {
    let content = fs::read(path).await.map_err(|e| {
        let serve_error = serve_error_from_io(&e);
        if serve_error == ServeError::Forbidden {
            logger::log_error(&format!("Failed to read '{}': {e}", path.display()));
        }
        serve_error
    })?;

    let content_type = mime::get_content_type(path.extension().and_then(|e| e.to_str()));
    Ok((content, content_type))
}

fn serve_error_from_io(err: &io::Error) -> ServeError {
    if err.kind() == io::ErrorKind::PermissionDenied {
        ServeError::Forbidden
    } else {
        ServeError::NotFound
    }
}

/// Build the file response: 304 for a current client copy, 206 for a valid
/// Range, otherwise the full 200.
fn build_asset_response(
    data: &[u8],
    content_type: &'static str,
    ctx: &RequestContext<'_>,
) -> Response<Full<Bytes>> {
    let etag = cache::generate_etag(data);
    let total_size = data.len();

    if cache::check_etag_match(ctx.if_none_match.as_deref(), &etag) {
        return http::build_304_response(&etag);
    }

    match http::parse_range_header(ctx.range_header.as_deref(), total_size) {
        RangeParseResult::Valid(range) => {
            let start = range.start;
            let end = range.end_position(total_size);
            let body = if ctx.is_head {
                Bytes::new()
            } else {
                Bytes::from(data[start..=end].to_vec())
            };
            http::response::build_partial_response(body, content_type, &etag, start, end, total_size)
        }
        RangeParseResult::NotSatisfiable => http::build_416_response(total_size),
        RangeParseResult::None => {
            let body = Bytes::from(data.to_owned());
            http::response::build_cached_response(body, content_type, &etag, ctx.is_head)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use std::sync::atomic::{AtomicU32, Ordering};

    static SITE_COUNTER: AtomicU32 = AtomicU32::new(0);

    /// Scratch site root under the OS temp dir, removed on drop.
    struct TempSite {
        root: PathBuf,
    }

    impl TempSite {
        fn new() -> Self {
            let id = SITE_COUNTER.fetch_add(1, Ordering::SeqCst);
            let root = std::env::temp_dir().join(format!(
                "portfolio-server-test-{}-{id}",
                std::process::id()
            ));
            std_fs::create_dir_all(&root).unwrap();
            Self { root }
        }

        fn write(&self, rel: &str, contents: &str) {
            let path = self.root.join(rel);
            if let Some(parent) = path.parent() {
                std_fs::create_dir_all(parent).unwrap();
            }
            std_fs::write(path, contents).unwrap();
        }

        fn mkdir(&self, rel: &str) {
            std_fs::create_dir_all(self.root.join(rel)).unwrap();
        }

        fn root(&self) -> &str {
            self.root.to_str().unwrap()
        }
    }

    impl Drop for TempSite {
        fn drop(&mut self) {
            let _ = std_fs::remove_dir_all(&self.root);
        }
    }

    #[test]
    fn test_resolve_plain_file() {
        let site = TempSite::new();
        site.write("style.css", "body{}");
        let resolved = resolve_asset_path(site.root(), "style.css").unwrap();
        assert!(resolved.ends_with("style.css"));
    }

    #[test]
    fn test_resolve_nested_file() {
        let site = TempSite::new();
        site.write("img/logo.png", "png-bytes");
        let resolved = resolve_asset_path(site.root(), "img/logo.png").unwrap();
        assert!(resolved.ends_with("img/logo.png"));
    }

    #[test]
    fn test_resolve_missing_file() {
        let site = TempSite::new();
        assert_eq!(
            resolve_asset_path(site.root(), "nope.xyz"),
            Err(ServeError::NotFound)
        );
    }

    #[test]
    fn test_resolve_directory_with_index() {
        let site = TempSite::new();
        site.write("about/index.html", "<p>about</p>");
        let resolved = resolve_asset_path(site.root(), "about").unwrap();
        assert!(resolved.ends_with("about/index.html"));
        let resolved = resolve_asset_path(site.root(), "about/").unwrap();
        assert!(resolved.ends_with("about/index.html"));
    }

    #[test]
    fn test_resolve_directory_without_index() {
        let site = TempSite::new();
        site.mkdir("empty");
        assert_eq!(
            resolve_asset_path(site.root(), "empty"),
            Err(ServeError::NotFound)
        );
    }

    #[test]
    fn test_resolve_empty_path_is_root_index() {
        let site = TempSite::new();
        site.write("index.html", "Hello");
        let resolved = resolve_asset_path(site.root(), "").unwrap();
        assert!(resolved.ends_with("index.html"));
    }

    #[test]
    fn test_traversal_is_blocked() {
        let site = TempSite::new();
        site.write("index.html", "Hello");
        // A sibling file outside the served root
        let outside = site.root.parent().unwrap().join(format!(
            "portfolio-server-outside-{}",
            std::process::id()
        ));
        std_fs::write(&outside, "secret").unwrap();
        let outside_name = outside.file_name().unwrap().to_str().unwrap();

        let attempts = [
            format!("../{outside_name}"),
            format!("../../{outside_name}"),
            format!("foo/../../{outside_name}"),
        ];
        for attempt in &attempts {
            assert_eq!(
                resolve_asset_path(site.root(), attempt),
                Err(ServeError::NotFound),
                "traversal not blocked: {attempt}"
            );
        }

        let _ = std_fs::remove_file(outside);
    }

    #[test]
    fn test_missing_root_dir() {
        assert_eq!(
            resolve_asset_path("/definitely/not/a/dir", "index.html"),
            Err(ServeError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_load_from_root_returns_bytes_and_type() {
        let site = TempSite::new();
        site.write("style.css", "body{}");
        let (content, content_type) = load_from_root(site.root(), "style.css").await.unwrap();
        assert_eq!(content, b"body{}");
        assert_eq!(content_type, "text/css");
    }

    #[tokio::test]
    async fn test_load_unknown_extension() {
        let site = TempSite::new();
        site.write("data.bin", "\x00\x01");
        let (_, content_type) = load_from_root(site.root(), "data.bin").await.unwrap();
        assert_eq!(content_type, "application/octet-stream");
    }

    fn ctx<'a>(path: &'a str) -> RequestContext<'a> {
        RequestContext {
            path,
            is_head: false,
            if_none_match: None,
            range_header: None,
        }
    }

    #[tokio::test]
    async fn test_serve_asset_full_response() {
        let site = TempSite::new();
        site.write("style.css", "body{}");
        let response = serve_asset(&ctx("/static/style.css"), site.root(), "style.css").await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers().get("Content-Type").unwrap(), "text/css");
        assert_eq!(response.headers().get("Content-Length").unwrap(), "6");
        assert!(response.headers().get("ETag").is_some());
    }

    #[tokio::test]
    async fn test_serve_asset_missing_is_404() {
        let site = TempSite::new();
        let response = serve_asset(&ctx("/missing.js"), site.root(), "missing.js").await;
        assert_eq!(response.status(), 404);
    }

    #[tokio::test]
    async fn test_serve_asset_if_none_match_is_304() {
        let site = TempSite::new();
        site.write("style.css", "body{}");
        let etag = cache::generate_etag(b"body{}");
        let context = RequestContext {
            path: "/style.css",
            is_head: false,
            if_none_match: Some(etag),
            range_header: None,
        };
        let response = serve_asset(&context, site.root(), "style.css").await;
        assert_eq!(response.status(), 304);
    }

    #[tokio::test]
    async fn test_serve_asset_range() {
        let site = TempSite::new();
        site.write("style.css", "body{}");
        let context = RequestContext {
            path: "/style.css",
            is_head: false,
            if_none_match: None,
            range_header: Some("bytes=0-3".to_string()),
        };
        let response = serve_asset(&context, site.root(), "style.css").await;
        assert_eq!(response.status(), 206);
        assert_eq!(
            response.headers().get("Content-Range").unwrap(),
            "bytes 0-3/6"
        );
    }

    #[tokio::test]
    async fn test_serve_root_document() {
        let site = TempSite::new();
        site.write("index.html", "Hello");
        let site_cfg = SiteConfig {
            root_dir: site.root().to_string(),
            root_document: "index.html".to_string(),
            service_name: "svc".to_string(),
            fail_fast: false,
        };
        let response = serve_root_document(&ctx("/"), &site_cfg).await;
        assert_eq!(response.status(), 200);
        assert_eq!(
            response.headers().get("Content-Type").unwrap(),
            "text/html; charset=utf-8"
        );
        assert_eq!(response.headers().get("Content-Length").unwrap(), "5");
    }

    #[tokio::test]
    async fn test_serve_root_document_missing_is_404() {
        let site = TempSite::new();
        let site_cfg = SiteConfig {
            root_dir: site.root().to_string(),
            root_document: "index.html".to_string(),
            service_name: "svc".to_string(),
            fail_fast: false,
        };
        let response = serve_root_document(&ctx("/"), &site_cfg).await;
        assert_eq!(response.status(), 404);
    }
}
