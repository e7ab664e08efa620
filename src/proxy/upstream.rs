//! Upstream request forwarding
//!
//! Sends a request to an already-computed destination URL and relays the
//! backend's answer. The forwarder knows nothing about rewrite rules.

use crate::http::request::{Method, Request};
use crate::http::response::{Response, StatusCode};
use anyhow::{Context, Result};
use bytes::Bytes;
use std::net::SocketAddr;
use std::time::Duration;

/// Headers that describe a single connection and are never forwarded.
const HOP_BY_HOP: &[&str] = &[
    "Connection",
    "Keep-Alive",
    "Proxy-Connection",
    "Proxy-Authenticate",
    "Proxy-Authorization",
    "TE",
    "Trailer",
    "Transfer-Encoding",
    "Upgrade",
];

/// Forwards requests to backend URLs.
pub struct Forwarder {
    client: reqwest::Client,
}

impl Forwarder {
    /// Create a new forwarder
    ///
    /// `connect_timeout` bounds TCP and TLS setup, `request_timeout` bounds
    /// the whole exchange including the response body.
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("Failed to build upstream HTTP client")?;

        Ok(Self { client })
    }

    /// Forward `request` to `destination` and return the backend's response.
    ///
    /// Errors cover everything that prevents a backend response from being
    /// read: an unparsable destination, DNS, connect, TLS, timeouts.
    pub async fn forward(
        &self,
        request: &Request,
        destination: &str,
        peer: SocketAddr,
    ) -> Result<Response> {
        let url = url::Url::parse(destination)
            .with_context(|| format!("Invalid destination URL {destination:?}"))?;

        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes())
            .with_context(|| format!("Unsupported method {}", request.method.as_str()))?;

        let mut builder = self.client.request(method, url.clone());
        for (key, value) in upstream_headers(request, &url, peer) {
            builder = builder.header(key, value);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let upstream = builder
            .send()
            .await
            .with_context(|| format!("Upstream request to {} failed", url.origin().ascii_serialization()))?;

        tracing::trace!(status = upstream.status().as_u16(), "Upstream response headers received");

        relay_response(&request.method, upstream).await
    }
}

/// Builds the header list sent to the backend.
///
/// Hop-by-hop headers, anything named in the client's Connection header, and
/// Content-Length are dropped (the client library recomputes the length).
/// Host is set to the destination authority and the X-Forwarded-* headers
/// describe the original request.
pub fn upstream_headers(
    request: &Request,
    destination: &url::Url,
    peer: SocketAddr,
) -> Vec<(String, String)> {
    let connection_listed: Vec<&str> = request
        .header("Connection")
        .map(|v| v.split(',').map(str::trim).collect())
        .unwrap_or_default();

    let mut headers: Vec<(String, String)> = request
        .headers
        .iter()
        .filter(|(k, _)| {
            !is_hop_by_hop(k)
                && !connection_listed.iter().any(|c| c.eq_ignore_ascii_case(k))
                && !k.eq_ignore_ascii_case("Host")
                && !k.eq_ignore_ascii_case("Content-Length")
                && !k.eq_ignore_ascii_case("X-Forwarded-For")
        })
        .cloned()
        .collect();

    if let Some(host) = destination.host_str() {
        let host_value = match destination.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        headers.push(("Host".to_string(), host_value));
    }

    let forwarded_for = match request.header("X-Forwarded-For") {
        Some(existing) => format!("{}, {}", existing, peer.ip()),
        None => peer.ip().to_string(),
    };
    headers.push(("X-Forwarded-For".to_string(), forwarded_for));

    if request.header("X-Forwarded-Host").is_none() {
        if let Some(host) = request.header("Host") {
            headers.push(("X-Forwarded-Host".to_string(), host.to_string()));
        }
    }
    if request.header("X-Forwarded-Proto").is_none() {
        headers.push(("X-Forwarded-Proto".to_string(), "http".to_string()));
    }

    headers
}

/// Turns a backend response into a client response.
///
/// Status, headers and body are relayed untouched apart from hop-by-hop
/// headers (including any the backend lists in its Connection header) and
/// Content-Length, which is recomputed from the buffered body.
async fn relay_response(method: &Method, upstream: reqwest::Response) -> Result<Response> {
    let status = StatusCode::from_u16(upstream.status().as_u16());
    let connection_listed = connection_tokens(upstream.headers());

    let mut headers = Vec::with_capacity(upstream.headers().len() + 1);
    let mut upstream_length = None;
    for (name, value) in upstream.headers() {
        let name = name.as_str();
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();

        if name.eq_ignore_ascii_case("Content-Length") {
            upstream_length = Some(value);
            continue;
        }
        if is_hop_by_hop(name) || connection_listed.iter().any(|c| c.eq_ignore_ascii_case(name)) {
            continue;
        }
        headers.push((name.to_string(), value));
    }

    let body = upstream
        .bytes()
        .await
        .context("Failed to read upstream response body")?;

    let code = status.as_u16();
    let bodyless = *method == Method::HEAD
        || status == StatusCode::NoContent
        || code == 304
        || code < 200;
    if bodyless {
        // The length describes the representation, not this (empty) body.
        if let Some(length) = upstream_length {
            if status != StatusCode::NoContent {
                headers.push(("Content-Length".to_string(), length));
            }
        }
    } else {
        headers.push(("Content-Length".to_string(), body.len().to_string()));
    }

    Ok(Response {
        status,
        headers,
        body: if bodyless { Bytes::new() } else { body },
    })
}

/// Maps a forwarding failure onto the response sent to the client.
pub fn error_response(error: &anyhow::Error) -> Response {
    let timed_out = error.chain().any(|cause| {
        cause
            .downcast_ref::<reqwest::Error>()
            .is_some_and(reqwest::Error::is_timeout)
    });

    if timed_out {
        Response::plain(StatusCode::GatewayTimeout)
    } else {
        Response::plain(StatusCode::BadGateway)
    }
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Header names listed in every Connection header of a backend response.
fn connection_tokens(headers: &reqwest::header::HeaderMap) -> Vec<String> {
    headers
        .get_all(reqwest::header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .collect()
}
