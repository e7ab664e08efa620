//! Waypoint - API path-rewrite proxy
//!
//! Forwards `/api/*` requests from a web frontend to a separately deployed
//! backend. The backend origin is resolved once at startup from
//! `NEXT_PUBLIC_API_URL` (falling back to a built-in default) and turned into
//! an ordered list of rewrite rules that the router applies per request.

pub mod config;
pub mod http;
pub mod proxy;
pub mod rewrite;
pub mod server;

use std::sync::Arc;

use config::Config;
use proxy::{Forwarder, Router};

/// Builds the request router for a loaded configuration.
pub fn build_router(cfg: &Config) -> anyhow::Result<Arc<Router>> {
    let rules = rewrite::build_rewrite_rules(&cfg.backend);
    let forwarder = Forwarder::new(cfg.server.connect_timeout, cfg.server.request_timeout)?;
    Ok(Arc::new(Router::new(rules, forwarder)))
}
