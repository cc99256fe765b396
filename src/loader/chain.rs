//! Transformation chain executor.
//!
//! Applies a rule's loader chain to one file's content. Loaders run in
//! REVERSE declaration order: the last-listed loader consumes the raw
//! content, its output feeds the loader declared immediately before it, and
//! the first-listed loader produces the final result. This mirrors
//! right-to-left functional composition and is a documented invariant - a
//! chain declared `[banner, minify-css]` minifies first, then prepends the
//! banner.
//!
//! The executor never reorders, deduplicates or skips loaders, and a chain
//! is always sequential: each step has a strict data dependency on the
//! previous output. Parallelism lives across files, never within a chain.

use std::path::Path;

use crate::config::LoaderSpec;
use crate::core::{BuildError, BuildMode};

use super::{LoaderContext, Registry};

/// Run a loader chain over one file's content.
///
/// `rule_index` is only for error attribution; the chain itself is opaque to
/// rule identity. Fails with the offending loader's identifier if any step
/// fails.
pub fn run_chain(
    registry: &Registry,
    content: String,
    loaders: &[LoaderSpec],
    mode: BuildMode,
    path: &Path,
    rule_index: usize,
) -> Result<String, BuildError> {
    let mut current = content;

    for spec in loaders.iter().rev() {
        let Some((name, loader)) = registry.get(&spec.name) else {
            // Unreachable after eager config validation, but the executor
            // stays total for registries supplied by tests.
            return Err(BuildError::UnknownLoader {
                name: spec.name.clone(),
                rule: rule_index,
            });
        };

        let ctx = LoaderContext {
            path,
            options: merged_options(&spec.options, mode),
            defines: mode.defines(),
        };

        current = loader(&current, &ctx).map_err(|source| BuildError::Transformation {
            loader: name,
            path: path.to_path_buf(),
            source,
        })?;
    }

    Ok(current)
}

/// Merge mode-derived options with a loader's static options.
///
/// The mode contributes `defines` (the active symbol list); static keys win
/// on collision so a rule can pin its own symbol set.
fn merged_options(static_options: &toml::Table, mode: BuildMode) -> toml::Table {
    let mut merged = toml::Table::new();
    merged.insert(
        "defines".into(),
        toml::Value::Array(
            mode.defines()
                .iter()
                .map(|s| toml::Value::String((*s).to_string()))
                .collect(),
        ),
    );
    for (key, value) in static_options {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LoaderError;
    use parking_lot::Mutex;

    /// Invocation log for the instrumented loaders. Each entry records the
    /// loader name and the content it received.
    static TRACE: Mutex<Vec<(&'static str, String)>> = Mutex::new(Vec::new());

    fn trace_a(content: &str, _ctx: &LoaderContext<'_>) -> Result<String, LoaderError> {
        TRACE.lock().push(("a", content.to_string()));
        Ok(format!("{content}+a"))
    }

    fn trace_b(content: &str, _ctx: &LoaderContext<'_>) -> Result<String, LoaderError> {
        TRACE.lock().push(("b", content.to_string()));
        Ok(format!("{content}+b"))
    }

    fn trace_c(content: &str, _ctx: &LoaderContext<'_>) -> Result<String, LoaderError> {
        TRACE.lock().push(("c", content.to_string()));
        Ok(format!("{content}+c"))
    }

    fn failing(_content: &str, _ctx: &LoaderContext<'_>) -> Result<String, LoaderError> {
        Err(LoaderError::Parse("boom".into()))
    }

    fn echo_options(_content: &str, ctx: &LoaderContext<'_>) -> Result<String, LoaderError> {
        Ok(toml::to_string(&ctx.options).unwrap_or_default())
    }

    fn test_registry() -> Registry {
        Registry::with(&[
            ("a", trace_a as crate::loader::LoaderFn),
            ("b", trace_b as crate::loader::LoaderFn),
            ("c", trace_c as crate::loader::LoaderFn),
            ("failing", failing as crate::loader::LoaderFn),
            ("echo-options", echo_options as crate::loader::LoaderFn),
        ])
    }

    fn spec(name: &str) -> LoaderSpec {
        LoaderSpec {
            name: name.into(),
            options: toml::Table::new(),
        }
    }

    fn spec_with(name: &str, key: &str, value: toml::Value) -> LoaderSpec {
        let mut options = toml::Table::new();
        options.insert(key.into(), value);
        LoaderSpec {
            name: name.into(),
            options,
        }
    }

    #[test]
    fn test_chain_runs_in_reverse_declaration_order() {
        TRACE.lock().clear();
        let registry = test_registry();

        let out = run_chain(
            &registry,
            "x".into(),
            &[spec("a"), spec("b"), spec("c")],
            BuildMode::DEVELOPMENT,
            Path::new("f.js"),
            0,
        )
        .unwrap();

        // C first, then B, then A produces the final result.
        assert_eq!(out, "x+c+b+a");

        let trace = TRACE.lock();
        let order: Vec<&str> = trace.iter().map(|(name, _)| *name).collect();
        assert_eq!(order, vec!["c", "b", "a"]);

        // Intermediate payloads: each loader consumes the prior output.
        assert_eq!(trace[0].1, "x");
        assert_eq!(trace[1].1, "x+c");
        assert_eq!(trace[2].1, "x+c+b");
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let registry = test_registry();
        let out = run_chain(
            &registry,
            "unchanged".into(),
            &[],
            BuildMode::PRODUCTION,
            Path::new("f.js"),
            0,
        )
        .unwrap();
        assert_eq!(out, "unchanged");
    }

    #[test]
    fn test_failure_names_the_offending_loader() {
        let registry = test_registry();
        let err = run_chain(
            &registry,
            "x".into(),
            &[spec("a"), spec("failing")],
            BuildMode::DEVELOPMENT,
            Path::new("src/f.js"),
            3,
        )
        .unwrap_err();

        match err {
            BuildError::Transformation { loader, path, .. } => {
                assert_eq!(loader, "failing");
                assert_eq!(path, Path::new("src/f.js"));
            }
            other => panic!("expected Transformation, got {other:?}"),
        }
    }

    #[test]
    fn test_mode_defines_reach_the_loader() {
        let registry = test_registry();
        let out = run_chain(
            &registry,
            String::new(),
            &[spec("echo-options")],
            BuildMode::DEVELOPMENT,
            Path::new("f.js"),
            0,
        )
        .unwrap();
        assert!(out.contains("DEBUG"));

        let out = run_chain(
            &registry,
            String::new(),
            &[spec("echo-options")],
            BuildMode::PRODUCTION,
            Path::new("f.js"),
            0,
        )
        .unwrap();
        assert!(!out.contains("DEBUG"));
    }

    #[test]
    fn test_static_options_win_on_collision() {
        let registry = test_registry();
        let pinned = spec_with(
            "echo-options",
            "defines",
            toml::Value::Array(vec![toml::Value::String("PINNED".into())]),
        );
        let out = run_chain(
            &registry,
            String::new(),
            &[pinned],
            BuildMode::DEVELOPMENT,
            Path::new("f.js"),
            0,
        )
        .unwrap();
        assert!(out.contains("PINNED"));
        assert!(!out.contains("DEBUG"));
    }

    #[test]
    fn test_unknown_loader_in_chain() {
        let registry = test_registry();
        let err = run_chain(
            &registry,
            "x".into(),
            &[spec("nonexistent")],
            BuildMode::DEVELOPMENT,
            Path::new("f.js"),
            7,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            BuildError::UnknownLoader { rule: 7, .. }
        ));
    }
}
