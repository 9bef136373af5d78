//! Request dispatch module
//!
//! Entry point for HTTP request processing: method gate, route match, handler
//! dispatch, CORS stamping, and the access log entry.

use crate::config::Config;
use crate::handler::static_files;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::routing::{self, RouteKind};
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request context carried into the file-serving handlers
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub range_header: Option<String>,
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    peer_addr: SocketAddr,
    cfg: Arc<Config>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();

    let mut response = dispatch(&req, &cfg).await;

    if cfg.http.enable_cors {
        http::apply_cors_headers(&mut response);
    }

    if cfg.logging.access_log {
        let entry = build_access_entry(&req, peer_addr, &response, started);
        logger::log_access(&entry, &cfg.logging.access_log_format);
    }

    Ok(response)
}

/// Gate the method, match the route, and run the matching handler.
async fn dispatch(
    req: &Request<hyper::body::Incoming>,
    cfg: &Config,
) -> Response<Full<Bytes>> {
    let method = req.method();

    match method {
        &Method::GET | &Method::HEAD => {}
        &Method::OPTIONS => return http::build_options_response(cfg.http.enable_cors),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            return http::build_405_response();
        }
    }

    if let Some(resp) = check_body_size(req, cfg.http.max_body_size) {
        return resp;
    }

    let ctx = RequestContext {
        path: req.uri().path(),
        is_head: *method == Method::HEAD,
        if_none_match: header_string(req, "if-none-match"),
        range_header: header_string(req, "range"),
    };

    match routing::match_route(ctx.path) {
        RouteKind::Root => static_files::serve_root_document(&ctx, &cfg.site).await,
        RouteKind::Health => http::build_health_response(&cfg.site.service_name),
        RouteKind::Static(rest) | RouteKind::Fallback(rest) => {
            static_files::serve_asset(&ctx, &cfg.site.root_dir, rest).await
        }
    }
}

/// Validate the declared Content-Length and reject oversized bodies.
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let size_str = req.headers().get("content-length")?.to_str().ok()?;
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response())
        }
        _ => None,
    }
}

fn header_string<B>(req: &Request<B>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn build_access_entry<B>(
    req: &Request<B>,
    peer_addr: SocketAddr,
    response: &Response<Full<Bytes>>,
    started: Instant,
) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = http_version_label(req.version()).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    entry.referer = header_string(req, "referer");
    entry.user_agent = header_string(req, "user-agent");
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}

fn http_version_label(version: Version) -> &'static str {
    if version == Version::HTTP_10 {
        "1.0"
    } else if version == Version::HTTP_2 {
        "2"
    } else {
        "1.1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_length(len: &str) -> Request<()> {
        Request::builder()
            .uri("/")
            .header("content-length", len)
            .body(())
            .unwrap()
    }

    #[test]
    fn test_body_size_within_limit() {
        assert!(check_body_size(&request_with_length("100"), 1000).is_none());
    }

    #[test]
    fn test_body_size_over_limit() {
        let resp = check_body_size(&request_with_length("2000"), 1000).unwrap();
        assert_eq!(resp.status(), 413);
    }

    #[test]
    fn test_body_size_unparseable_is_ignored() {
        assert!(check_body_size(&request_with_length("abc"), 1000).is_none());
    }

    #[test]
    fn test_body_size_absent_is_ignored() {
        let req = Request::builder().uri("/").body(()).unwrap();
        assert!(check_body_size(&req, 1000).is_none());
    }

    #[test]
    fn test_http_version_label() {
        assert_eq!(http_version_label(Version::HTTP_10), "1.0");
        assert_eq!(http_version_label(Version::HTTP_11), "1.1");
        assert_eq!(http_version_label(Version::HTTP_2), "2");
    }
}
