//! Static site server for the portfolio deployment.
//!
//! Serves a root HTML document, a liveness endpoint, and static assets from a
//! read-only directory tree over HTTP/1.1. The filesystem is never mutated;
//! the configuration is built once at startup and shared immutably.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod routing;
pub mod server;
