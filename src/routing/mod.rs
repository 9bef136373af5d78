//! Route matching module
//!
//! The route table is a fixed, ordered list of matchers evaluated top to
//! bottom; the first match wins. Keeping the order explicit here avoids the
//! precedence ambiguity of overlapping mounts.

/// Where a request path is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind<'a> {
    /// `/` — the configured root document.
    Root,
    /// `/health` — liveness payload, no I/O.
    Health,
    /// `/static/<rest>` — asset lookup with the mount prefix stripped.
    Static(&'a str),
    /// Anything else — asset lookup against the full path.
    Fallback(&'a str),
}

/// Match a request path against the route table.
///
/// Precedence: exact `/`, exact `/health`, the `/static/` mount, then the
/// fallback asset route.
pub fn match_route(path: &str) -> RouteKind<'_> {
    if path == "/" {
        return RouteKind::Root;
    }
    if path == "/health" {
        return RouteKind::Health;
    }
    if let Some(rest) = path.strip_prefix("/static/") {
        return RouteKind::Static(rest);
    }
    if path == "/static" {
        return RouteKind::Static("");
    }
    RouteKind::Fallback(path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_routes_win() {
        assert_eq!(match_route("/"), RouteKind::Root);
        assert_eq!(match_route("/health"), RouteKind::Health);
    }

    #[test]
    fn test_static_mount_strips_prefix() {
        assert_eq!(match_route("/static/style.css"), RouteKind::Static("style.css"));
        assert_eq!(
            match_route("/static/img/logo.png"),
            RouteKind::Static("img/logo.png")
        );
        assert_eq!(match_route("/static/"), RouteKind::Static(""));
        assert_eq!(match_route("/static"), RouteKind::Static(""));
    }

    #[test]
    fn test_fallback_catches_the_rest() {
        assert_eq!(match_route("/scripts.js"), RouteKind::Fallback("scripts.js"));
        assert_eq!(match_route("/about/"), RouteKind::Fallback("about/"));
        assert_eq!(match_route("/healthz"), RouteKind::Fallback("healthz"));
        // "/staticfile" is not under the /static/ mount
        assert_eq!(match_route("/staticfile"), RouteKind::Fallback("staticfile"));
    }

    #[test]
    fn test_health_subpaths_are_assets() {
        assert_eq!(
            match_route("/health/live"),
            RouteKind::Fallback("health/live")
        );
    }
}
