//! Loader registry and invocation context.
//!
//! Loaders are opaque, pure content-to-content transformations. The registry
//! is a static, closed set built at startup: a rule naming a loader outside
//! it fails at configuration load, before any file is processed.

mod builtin;
pub mod chain;

pub use chain::run_chain;

use std::path::Path;
use std::sync::LazyLock;

use rustc_hash::FxHashMap;

use crate::config::RuleConfig;
use crate::core::{BuildError, LoaderError};

/// A pure transformation: content in, content or an identifiable error out.
///
/// This contract is all the pipeline requires of any loader, however
/// implemented.
pub type LoaderFn = fn(&str, &LoaderContext<'_>) -> Result<String, LoaderError>;

/// Per-invocation context handed to a loader.
pub struct LoaderContext<'a> {
    /// The file being transformed (for diagnostics only; loaders never read
    /// the filesystem).
    pub path: &'a Path,

    /// Mode-derived options merged with the loader's static options.
    /// Static keys win on collision.
    pub options: toml::Table,

    /// Conditional-compilation symbols active under the current mode.
    pub defines: &'a [&'static str],
}

/// Closed-set loader registry: identifier → transformation function.
pub struct Registry {
    map: FxHashMap<&'static str, LoaderFn>,
}

static BUILTIN: LazyLock<Registry> = LazyLock::new(|| {
    Registry::with(&[
        ("minify-js", builtin::minify_js as LoaderFn),
        ("minify-css", builtin::minify_css as LoaderFn),
        ("json", builtin::json as LoaderFn),
        ("banner", builtin::banner as LoaderFn),
        ("strip-defines", builtin::strip_defines as LoaderFn),
        ("raw", builtin::raw as LoaderFn),
    ])
});

impl Registry {
    /// The builtin loader set.
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    /// Build a registry from explicit entries (used by tests to register
    /// instrumented loaders).
    pub fn with(entries: &[(&'static str, LoaderFn)]) -> Self {
        Self {
            map: entries.iter().copied().collect(),
        }
    }

    /// Look up a loader, returning its canonical name alongside the function.
    pub fn get(&self, name: &str) -> Option<(&'static str, LoaderFn)> {
        self.map.get_key_value(name).map(|(k, f)| (*k, *f))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }
}

/// Validate every loader identifier in the rule set against the builtin
/// registry. Called eagerly at configuration load.
pub fn validate_rules(rules: &[RuleConfig]) -> Result<(), BuildError> {
    for (index, rule) in rules.iter().enumerate() {
        for spec in &rule.loaders {
            if !Registry::builtin().contains(&spec.name) {
                return Err(BuildError::UnknownLoader {
                    name: spec.name.clone(),
                    rule: index,
                });
            }
        }
    }
    Ok(())
}
