//! Rule-driven request dispatch
//!
//! The router consults the rewrite rules in order. A match is forwarded to the
//! computed destination; anything else gets the default 404. A capture with
//! `.`/`..` segments is refused with 400 before anything is sent.

use crate::http::request::Request;
use crate::http::response::Response;
use crate::proxy::upstream::{self, Forwarder};
use crate::rewrite::RewriteRules;
use std::net::SocketAddr;

pub struct Router {
    rules: RewriteRules,
    forwarder: Forwarder,
}

impl Router {
    pub fn new(rules: RewriteRules, forwarder: Forwarder) -> Self {
        Self { rules, forwarder }
    }

    pub fn rules(&self) -> &RewriteRules {
        &self.rules
    }

    /// Produce the response for one inbound request.
    ///
    /// Never fails: forwarding errors become 502/504 responses.
    pub async fn dispatch(&self, request: &Request, peer: SocketAddr) -> Response {
        let Some(rewrite) = self.rules.resolve(&request.path) else {
            tracing::debug!(
                method = request.method.as_str(),
                path = %request.path,
                "No rewrite rule matched"
            );
            return Response::not_found();
        };

        if rewrite.has_dot_segment() {
            tracing::warn!(
                method = request.method.as_str(),
                path = %request.path,
                "Rejecting dot segment in rewritten path"
            );
            return Response::bad_request();
        }

        tracing::debug!(
            rule = %rewrite.rule.source(),
            method = request.method.as_str(),
            path = %request.path,
            destination = %rewrite.destination,
            "Rewriting request"
        );

        match self.forwarder.forward(request, &rewrite.destination, peer).await {
            Ok(response) => {
                tracing::info!(
                    status = response.status.as_u16(),
                    method = request.method.as_str(),
                    path = %request.path,
                    "Request forwarded"
                );
                response
            }
            Err(e) => {
                let response = upstream::error_response(&e);
                tracing::warn!(
                    error = %format!("{e:#}"),
                    status = response.status.as_u16(),
                    method = request.method.as_str(),
                    path = %request.path,
                    destination = %rewrite.destination,
                    "Failed to forward request"
                );
                response
            }
        }
    }
}
