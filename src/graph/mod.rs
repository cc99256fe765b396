//! Dependency discovery and per-file transformation.
//!
//! Starting from the entry point, each discovered file is matched against
//! the rule set, pushed through its loader chain, and scanned for import
//! specifiers; every specifier is resolved and enqueued. Files are
//! independent units of work, so each BFS wave is transformed in parallel
//! with rayon - no shared mutable state is written during transformation.
//!
//! Modules key by project-relative path and land in a `BTreeMap`, so the
//! final assembly order is a function of module identity, never of which
//! worker finished first.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use rayon::prelude::*;
use regex::Regex;
use rustc_hash::FxHashSet;

use crate::config::BuildConfig;
use crate::core::{BuildError, BuildMode};
use crate::loader::{Registry, run_chain};
use crate::matcher::RuleSet;
use crate::resolver::Resolver;
use crate::utils::path::module_id;
use crate::{debug, log};

/// One transformed module, ready for assembly.
#[derive(Debug)]
pub struct Module {
    /// Project-relative slash path; the module's identity.
    pub id: String,
    /// Absolute source path.
    pub path: PathBuf,
    /// Output of the loader chain (or raw content when no rule matched).
    pub content: String,
}

/// The fully transformed module set.
#[derive(Debug)]
pub struct DependencyGraph {
    /// Modules keyed by identity. Iteration order is deterministic.
    pub modules: BTreeMap<String, Module>,
    /// Identity of the entry module.
    pub entry_id: String,
}

/// Import specifiers in module content: `import ... from "s"`, `import "s"`
/// and `require("s")`, tolerant of minified spacing.
static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:\bimport\s*(?:[\w$*{},\s]*?\bfrom\s*)?|\brequire\s*\(\s*)["']([^"']+)["']"#)
        .expect("import pattern is valid")
});

/// Extract import specifiers in source order, deduplicated.
pub fn scan_imports(content: &str) -> Vec<String> {
    let mut seen = FxHashSet::default();
    IMPORT_RE
        .captures_iter(content)
        .map(|cap| cap[1].to_string())
        .filter(|spec| seen.insert(spec.clone()))
        .collect()
}

/// Walk the dependency graph from the entry point, transforming every file.
pub fn build_graph(
    config: &BuildConfig,
    rules: &RuleSet,
    resolver: &Resolver,
    registry: &Registry,
    mode: BuildMode,
) -> Result<DependencyGraph, BuildError> {
    let entry = config.entry_path();
    if !entry.is_file() {
        return Err(BuildError::ModuleNotFound {
            specifier: config.entry.display().to_string(),
            from: config.root.clone(),
        });
    }

    let entry_id = module_id(&entry, &config.root);
    let mut modules = BTreeMap::new();
    let mut seen: FxHashSet<PathBuf> = FxHashSet::default();
    seen.insert(entry.clone());
    let mut frontier = vec![entry];

    while !frontier.is_empty() {
        // Abort between waves; transformed-but-unmerged files are dropped,
        // so cancellation is all-or-nothing per file.
        if crate::core::is_shutdown() {
            return Err(BuildError::Cancelled);
        }

        let wave: Vec<Result<(Module, Vec<String>), BuildError>> = frontier
            .par_iter()
            .map(|path| process_file(path, config, rules, registry, mode))
            .collect();

        let mut next = Vec::new();
        for result in wave {
            let (module, imports) = result?;
            for specifier in imports {
                let resolved = resolver.resolve(&specifier, &module.path)?;
                debug!("resolve"; "{} -> {}", specifier, resolved.display());
                if seen.insert(resolved.clone()) {
                    next.push(resolved);
                }
            }
            modules.insert(module.id.clone(), module);
        }
        frontier = next;
    }

    log!("graph"; "{} module(s) from {}", modules.len(), entry_id);
    Ok(DependencyGraph { modules, entry_id })
}

/// Read, match, transform and scan one file.
fn process_file(
    path: &Path,
    config: &BuildConfig,
    rules: &RuleSet,
    registry: &Registry,
    mode: BuildMode,
) -> Result<(Module, Vec<String>), BuildError> {
    let raw = std::fs::read_to_string(path).map_err(|source| BuildError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let id = module_id(path, &config.root);

    // No matching rule: the file passes through unmodified.
    let content = match rules.rule_for(&id)? {
        Some(rule) => {
            debug!("build"; "{} via rule #{}", id, rule.index);
            run_chain(registry, raw, &rule.loaders, mode, path, rule.index)?
        }
        None => raw,
    };

    let imports = scan_imports(&content);
    Ok((Module { id, path: path.to_path_buf(), content }, imports))
}
