//! `[[proxy]]` section configuration.
//!
//! Forwarding rules for the development server. Checked in declared order,
//! first matching prefix wins. Never consulted in production mode.
//!
//! # Example
//!
//! ```toml
//! [[proxy]]
//! prefix = "/api/"                    # "/api/*" is accepted as well
//! target = "http://localhost:8085"
//! change_origin = true                # rewrite Host to the target origin
//! ```

use serde::{Deserialize, Serialize};

/// One forwarding rule for the dev proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyRuleConfig {
    /// Path prefix to match. A trailing `*` is tolerated and stripped.
    pub prefix: String,

    /// Target origin the request is forwarded to. Must be a bare http(s)
    /// origin; a target carrying its own path is rejected at load.
    pub target: String,

    /// Rewrite the Host header to the target origin. When false, the
    /// client's Host is preserved, which matters for backend virtual
    /// hosting and CORS checks.
    #[serde(default)]
    pub change_origin: bool,
}
