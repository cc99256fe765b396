//! Development proxy routing.
//!
//! Matches incoming request paths against the configured forwarding rules,
//! in declared order, first match wins. A decision carries the rewritten
//! target URL and the Host header policy: with `change_origin` the backend
//! sees the target's own hostname, otherwise it sees the client-facing one
//! (which matters for backend virtual hosting and CORS checks).
//!
//! The router is only ever constructed for development serving; production
//! serves everything statically and never consults it. Forwarding failures
//! are request-scoped and never abort anything (see `forward`).

pub mod forward;

pub use forward::ProxyError;

use thiserror::Error;
use url::Url;

use crate::config::ProxyRuleConfig;

/// A forwarding rule with its target parsed.
#[derive(Debug, Clone)]
pub struct ProxyRule {
    /// Normalized path prefix (a trailing `*` in config is stripped).
    prefix: String,
    /// Target origin.
    pub target: Url,
    /// Rewrite the Host header to the target origin.
    pub change_origin: bool,
}

/// Where to forward a request, and under which Host header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardDecision {
    /// Full target URL (origin + original path and query).
    pub url: Url,
    /// `Some(authority)` when the Host header must be rewritten to the
    /// target origin; `None` preserves the client's Host.
    pub host: Option<String>,
}

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("invalid proxy target `{target}`: {reason}")]
    InvalidTarget { target: String, reason: String },
}

/// Ordered forwarding rules, fully materialized before the first request.
#[derive(Debug, Clone)]
pub struct ProxyRouter {
    rules: Vec<ProxyRule>,
}

impl ProxyRouter {
    pub fn from_config(rules: &[ProxyRuleConfig]) -> Result<Self, RouterError> {
        let rules = rules
            .iter()
            .map(|rule| {
                let target =
                    Url::parse(&rule.target).map_err(|e| RouterError::InvalidTarget {
                        target: rule.target.clone(),
                        reason: e.to_string(),
                    })?;
                Ok(ProxyRule {
                    prefix: rule.prefix.trim_end_matches('*').to_string(),
                    target,
                    change_origin: rule.change_origin,
                })
            })
            .collect::<Result<Vec<_>, RouterError>>()?;
        Ok(Self { rules })
    }

    /// Decide whether a request is forwarded. `None` means the request is
    /// served from the bundle output instead.
    pub fn route(&self, request_url: &str) -> Option<ForwardDecision> {
        let path = request_url.split('?').next().unwrap_or(request_url);

        // First matching rule wins; later rules are not consulted.
        let rule = self.rules.iter().find(|rule| path.starts_with(&rule.prefix))?;

        let url = rule.target.join(request_url).ok()?;
        Some(ForwardDecision {
            url,
            host: if rule.change_origin {
                Some(authority(&rule.target))
            } else {
                None
            },
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// `host[:port]` as it appears in a Host header.
fn authority(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    }
}
