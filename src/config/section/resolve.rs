//! `[resolve]` section configuration.
//!
//! Ordered search roots and extension candidates for import resolution.
//!
//! # Example
//!
//! ```toml
//! [resolve]
//! roots = ["vendor", "src"]   # tried in order, first hit wins
//! extensions = [".js"]        # tried when a specifier has no extension
//! ```
//!
//! The implicit default root `modules/` is always tried after the explicit
//! roots, unless it is listed explicitly to reorder it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Directory tried after all explicit roots unless explicitly listed.
pub const DEFAULT_ROOT: &str = "modules";

/// Import resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Ordered search roots for bare specifiers, relative to the project root.
    pub roots: Vec<PathBuf>,

    /// Extensions tried (in order) when a specifier has none.
    pub extensions: Vec<String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            extensions: vec![".js".into()],
        }
    }
}
