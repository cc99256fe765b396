//! Request forwarding for the dev proxy.
//!
//! Forwarding is I/O against a live backend process, so unlike resolution
//! and transformation errors it is worth one retry with backoff. A backend
//! that stays unreachable costs the request a 502, never the server.

use std::io::Read;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;
use tiny_http::{Header, Request, Response, StatusCode};

use super::ForwardDecision;
use crate::log;

/// Backend connect/read failure. Request-scoped, never fatal.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("proxy target `{target}` unreachable")]
    TargetUnreachable {
        target: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Delay before the single retry.
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

static CLIENT: LazyLock<reqwest::blocking::Client> = LazyLock::new(|| {
    reqwest::blocking::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(30))
        .build()
        .expect("proxy client construction cannot fail")
});

/// Hop-by-hop headers that must not be copied in either direction.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// Forward a request per the routing decision and relay the response.
///
/// An unreachable target is retried once with backoff, then answered with a
/// 502 gateway error. Both outcomes leave the server running.
pub fn forward(mut request: Request, decision: &ForwardDecision) -> Result<()> {
    let mut body = Vec::new();
    request.as_reader().read_to_end(&mut body)?;

    match send(&request, decision, body) {
        Ok(response) => relay(request, response),
        Err(err) => {
            log!("proxy"; "{err}; serving 502");
            let response = Response::from_string("502 Bad Gateway: proxy target unreachable")
                .with_status_code(StatusCode(502));
            request.respond(response)?;
            Ok(())
        }
    }
}

/// Send the upstream request, retrying once on connect failure.
fn send(
    request: &Request,
    decision: &ForwardDecision,
    body: Vec<u8>,
) -> Result<reqwest::blocking::Response, ProxyError> {
    match send_once(request, decision, body.clone()) {
        Ok(response) => Ok(response),
        Err(err) if err.is_connect() || err.is_timeout() => {
            std::thread::sleep(RETRY_BACKOFF);
            send_once(request, decision, body).map_err(|source| ProxyError::TargetUnreachable {
                target: decision.url.to_string(),
                source,
            })
        }
        Err(source) => Err(ProxyError::TargetUnreachable {
            target: decision.url.to_string(),
            source,
        }),
    }
}

fn send_once(
    request: &Request,
    decision: &ForwardDecision,
    body: Vec<u8>,
) -> Result<reqwest::blocking::Response, reqwest::Error> {
    let method = reqwest::Method::from_bytes(request.method().as_str().as_bytes())
        .unwrap_or(reqwest::Method::GET);

    let mut upstream = CLIENT.request(method, decision.url.clone());

    for header in request.headers() {
        let name = header.field.as_str().as_str();
        if is_hop_by_hop(name) || name.eq_ignore_ascii_case("host") {
            continue;
        }
        upstream = upstream.header(name, header.value.as_str());
    }

    // Host policy: rewrite to the target origin, or preserve the client's.
    let host = match &decision.host {
        Some(target_host) => Some(target_host.clone()),
        None => request
            .headers()
            .iter()
            .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case("host"))
            .map(|h| h.value.as_str().to_string()),
    };
    if let Some(host) = host {
        upstream = upstream.header(reqwest::header::HOST, host);
    }

    upstream.body(body).send()
}

/// Relay the upstream response back to the client.
fn relay(request: Request, upstream: reqwest::blocking::Response) -> Result<()> {
    let status = StatusCode(upstream.status().as_u16());

    let headers: Vec<Header> = upstream
        .headers()
        .iter()
        .filter(|(name, _)| {
            !is_hop_by_hop(name.as_str()) && !name.as_str().eq_ignore_ascii_case("content-length")
        })
        .filter_map(|(name, value)| {
            Header::from_bytes(name.as_str().as_bytes(), value.as_bytes()).ok()
        })
        .collect();

    let body = upstream.bytes().map(|b| b.to_vec()).unwrap_or_default();
    let len = body.len();
    let response = Response::new(status, headers, std::io::Cursor::new(body), Some(len), None);

    request.respond(response)?;
    Ok(())
}
