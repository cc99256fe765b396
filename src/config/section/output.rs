//! `[output]` section configuration.
//!
//! Describes the single deployable artifact.
//!
//! # Example
//!
//! ```toml
//! [output]
//! filename = "bundle.js"    # emitted bundle name
//! public_path = "/public"   # URL prefix for emitted asset references
//! dir = "public"            # output directory (relative to project root)
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Output artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Emitted bundle file name.
    pub filename: String,

    /// Public base path prefixed onto emitted asset URLs.
    pub public_path: String,

    /// Output directory, relative to the project root.
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            filename: "bundle.js".into(),
            public_path: "/".into(),
            dir: PathBuf::from("public"),
        }
    }
}
