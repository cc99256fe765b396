//! Build configuration management for `fardel.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── output     # [output]
//! │   ├── resolve    # [resolve]
//! │   ├── rules      # [[rules]]
//! │   ├── proxy      # [[proxy]]
//! │   └── serve      # [serve]
//! ├── types/         # Utility types
//! │   └── error      # ConfigError
//! └── mod.rs         # BuildConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section     | Purpose                                           |
//! |-------------|---------------------------------------------------|
//! | `entry`     | Entry point path (top-level key)                  |
//! | `[output]`  | Bundle name, public base path, output directory   |
//! | `[resolve]` | Ordered search roots and extension candidates     |
//! | `[[rules]]` | Transformation rules (test, exclude, loaders)     |
//! | `[[proxy]]` | Dev proxy forwarding rules                        |
//! | `[serve]`   | Development server (port, interface, watch)       |
//!
//! The configuration is constructed once per invocation and read-only
//! thereafter. All validation happens here, eagerly, before any file is
//! processed: rule patterns must compile, loader names must exist in the
//! builtin registry, proxy targets must be HTTP(S) origins.

pub mod section;
pub mod types;

pub use section::{
    DEFAULT_ROOT, LoaderSpec, OutputConfig, ProxyRuleConfig, ResolveConfig, RuleConfig,
    ServeConfig,
};
pub use types::ConfigError;

use crate::{cli::Cli, log};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use url::Url;

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing fardel.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Entry point path, relative to the project root.
    pub entry: PathBuf,

    /// Output artifact settings
    pub output: OutputConfig,

    /// Import resolution settings
    pub resolve: ResolveConfig,

    /// Transformation rules, in declared order
    pub rules: Vec<RuleConfig>,

    /// Dev proxy forwarding rules, in declared order
    pub proxy: Vec<ProxyRuleConfig>,

    /// Development server settings
    pub serve: ServeConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            root: PathBuf::new(),
            entry: PathBuf::from("src/main.js"),
            output: OutputConfig::default(),
            resolve: ResolveConfig::default(),
            rules: Vec::new(),
            proxy: Vec::new(),
            serve: ServeConfig::default(),
        }
    }
}

impl BuildConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd to find the config file. The project root is
    /// the config file's parent directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let Some(config_path) = find_config_file(&cli.config) else {
            log!(
                "error";
                "Config file '{}' not found in this directory or any parent.",
                cli.config.display()
            );
            std::process::exit(1);
        };

        let mut config = Self::from_path(&config_path)?;

        config.config_path = config_path.clone();
        config.root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        config.validate()?;
        Ok(config)
    }

    /// Parse a config file, warning about unknown keys.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_str_logged(&content)
    }

    /// Parse config TOML; unknown keys are logged, not fatal.
    fn from_str_logged(content: &str) -> Result<Self> {
        let de = toml::de::Deserializer::new(content);
        let mut unknown = Vec::new();
        let config: Self = serde_ignored::deserialize(de, |path| {
            unknown.push(path.to_string());
        })
        .map_err(ConfigError::Toml)
        .context("failed to parse fardel.toml")?;

        for key in unknown {
            log!("config"; "unknown key `{}` ignored", key);
        }
        Ok(config)
    }

    /// Eager validation, before any file is processed.
    ///
    /// Unknown loader identifiers and malformed patterns fail here so a
    /// misconfigured build never gets as far as transforming files.
    fn validate(&self) -> Result<()> {
        // Rule patterns must compile (discards the compiled set; the build
        // driver compiles its own)
        crate::matcher::RuleSet::compile(&self.rules)?;

        // Loader identifiers must name builtin registry entries
        crate::loader::validate_rules(&self.rules)?;

        // Proxy targets must be HTTP(S) origins
        for rule in &self.proxy {
            let url = Url::parse(&rule.target).map_err(|e| {
                ConfigError::Validation(format!("proxy target `{}`: {}", rule.target, e))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::Validation(format!(
                    "proxy target `{}` must be an http(s) origin",
                    rule.target
                ))
                .into());
            }
            // Forwarding joins the request path onto the target, which would
            // silently discard any path on the target itself.
            if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
                return Err(ConfigError::Validation(format!(
                    "proxy target `{}` must be a bare origin without a path",
                    rule.target
                ))
                .into());
            }
        }

        Ok(())
    }

    // ------------------------------------------------------------------------
    // Path helpers
    // ------------------------------------------------------------------------

    /// Join a path onto the project root.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Absolute entry point path.
    pub fn entry_path(&self) -> PathBuf {
        self.root_join(&self.entry)
    }

    /// Absolute output directory.
    pub fn output_dir(&self) -> PathBuf {
        self.root_join(&self.output.dir)
    }

    /// Absolute bundle file path.
    pub fn bundle_path(&self) -> PathBuf {
        self.output_dir().join(&self.output.filename)
    }

    /// Absolute search roots in resolution order.
    ///
    /// The implicit default root is appended after the explicit roots unless
    /// it was listed explicitly to reorder it.
    pub fn search_roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = self
            .resolve
            .roots
            .iter()
            .map(|r| self.root_join(r))
            .collect();

        let default = Path::new(DEFAULT_ROOT);
        if !self.resolve.roots.iter().any(|r| r == default) {
            roots.push(self.root_join(default));
        }
        roots
    }
}

// ============================================================================
// config file discovery
// ============================================================================

/// Find the config file: absolute paths are taken as-is, relative names are
/// searched upward from the current directory.
fn find_config_file(name: &Path) -> Option<PathBuf> {
    if name.is_absolute() {
        return name.is_file().then(|| name.to_path_buf());
    }

    let cwd = std::env::current_dir().ok()?;
    for dir in cwd.ancestors() {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

// ============================================================================
// test helpers
// ============================================================================

/// Parse a config snippet for section tests.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> BuildConfig {
    BuildConfig::from_str_logged(content).expect("test config should parse")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_default() {
        let config = test_parse_config("");
        assert_eq!(config.entry, PathBuf::from("src/main.js"));
    }

    #[test]
    fn test_search_roots_append_implicit_default() {
        let mut config = test_parse_config("[resolve]\nroots = [\"vendor\", \"src\"]");
        config.root = PathBuf::from("/proj");

        let roots = config.search_roots();
        assert_eq!(
            roots,
            vec![
                PathBuf::from("/proj/vendor"),
                PathBuf::from("/proj/src"),
                PathBuf::from("/proj/modules"),
            ]
        );
    }

    #[test]
    fn test_search_roots_explicit_default_not_duplicated() {
        let mut config = test_parse_config("[resolve]\nroots = [\"modules\", \"src\"]");
        config.root = PathBuf::from("/proj");

        let roots = config.search_roots();
        assert_eq!(
            roots,
            vec![PathBuf::from("/proj/modules"), PathBuf::from("/proj/src")]
        );
    }

    #[test]
    fn test_validate_rejects_bad_pattern() {
        let config = test_parse_config("[[rules]]\ntest = \"[unclosed\"");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_loader() {
        let config = test_parse_config(
            "[[rules]]\ntest = \"\\\\.js$\"\n[[rules.loaders]]\nname = \"no-such-loader\"",
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_path_bearing_proxy_target() {
        // A path on the target would be discarded when the request path is
        // joined onto it.
        let config = test_parse_config(
            "[[proxy]]\nprefix = \"/api/\"\ntarget = \"http://localhost:8085/base\"",
        );
        assert!(config.validate().is_err());

        let config =
            test_parse_config("[[proxy]]\nprefix = \"/api/\"\ntarget = \"http://localhost:8085\"");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_non_http_proxy_target() {
        let config =
            test_parse_config("[[proxy]]\nprefix = \"/api/\"\ntarget = \"ftp://localhost\"");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_full_config() {
        let config = test_parse_config(
            r#"
entry = "src/app.js"

[output]
filename = "bundle.js"
public_path = "/public"
dir = "public"

[resolve]
roots = ["vendor", "src"]

[[rules]]
test = "\\.js$"
exclude = "modules"
[[rules.loaders]]
name = "minify-js"

[[proxy]]
prefix = "/api/*"
target = "http://localhost:8085"
change_origin = true
"#,
        );
        assert!(config.validate().is_ok());
    }
}
