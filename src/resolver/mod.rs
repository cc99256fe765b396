//! Import specifier resolution.
//!
//! Resolves an import specifier to a concrete file:
//!
//! - relative specifiers (`./x`, `../x`) resolve against the importing
//!   file's directory;
//! - bare specifiers walk the configured search roots IN DECLARED ORDER -
//!   first root containing a match wins, a linear scan with no merging or
//!   priority blending. A root that lacks the file (or does not exist at
//!   all) simply passes the turn to the next root;
//! - specifiers without an extension also try the configured extension
//!   candidates within a root before the next root is consulted.
//!
//! Resolution is a pure function of (configuration, filesystem state), so
//! repeated lookups within one build go through a read-through cache keyed
//! by (specifier, importer directory). Exhausting all roots is fatal.

use std::path::{Path, PathBuf};

use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

use crate::config::BuildConfig;
use crate::core::BuildError;
use crate::utils::path::clean;

/// Search-root resolver with a per-build cache.
pub struct Resolver {
    /// Absolute search roots, in resolution order (implicit default last).
    roots: Vec<PathBuf>,
    /// Extension candidates for extensionless specifiers.
    extensions: Vec<String>,
    /// (specifier, importer dir) → resolved path. Safe to share across
    /// worker threads; resolution is pure.
    cache: DashMap<(String, PathBuf), PathBuf, FxBuildHasher>,
}

impl Resolver {
    pub fn new(config: &BuildConfig) -> Self {
        Self {
            roots: config.search_roots(),
            extensions: config.resolve.extensions.clone(),
            cache: DashMap::default(),
        }
    }

    /// Resolver over explicit roots (used by tests).
    #[cfg(test)]
    pub fn with_roots(roots: Vec<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            roots,
            extensions,
            cache: DashMap::default(),
        }
    }

    /// Resolve `specifier` as imported from the file at `from`.
    pub fn resolve(&self, specifier: &str, from: &Path) -> Result<PathBuf, BuildError> {
        let importer_dir = from.parent().unwrap_or(Path::new("")).to_path_buf();
        let key = (specifier.to_string(), importer_dir.clone());

        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.clone());
        }

        let resolved = self.resolve_uncached(specifier, &importer_dir).ok_or_else(|| {
            BuildError::ModuleNotFound {
                specifier: specifier.to_string(),
                from: from.to_path_buf(),
            }
        })?;

        self.cache.insert(key, resolved.clone());
        Ok(resolved)
    }

    fn resolve_uncached(&self, specifier: &str, importer_dir: &Path) -> Option<PathBuf> {
        if specifier.starts_with("./") || specifier.starts_with("../") {
            return self.try_candidates(&importer_dir.join(specifier));
        }

        // First-match-wins linear scan over the declared roots. An earlier
        // root without the file must not short-circuit the scan.
        for root in &self.roots {
            if let Some(found) = self.try_candidates(&root.join(specifier)) {
                return Some(found);
            }
        }
        None
    }

    /// Try the exact path, then extension-suffixed variants when the
    /// specifier has no extension.
    fn try_candidates(&self, base: &Path) -> Option<PathBuf> {
        let base = clean(base);
        if base.is_file() {
            return Some(base);
        }
        if base.extension().is_some() {
            return None;
        }
        for ext in &self.extensions {
            let mut candidate = base.as_os_str().to_os_string();
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }
}
