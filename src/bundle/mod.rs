//! Bundle assembly and output.
//!
//! Merges the transformed module set into the single deployable artifact.
//! Assembly keys by module identity (the graph's `BTreeMap` order), never by
//! completion time, so the bundle is byte-identical across runs regardless
//! of worker scheduling. The entry module is emitted last so everything it
//! pulls in is defined above it.
//!
//! The artifact is written to a temp file in the output directory and
//! renamed into place: a failed build never leaves partial output.

use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::config::BuildConfig;
use crate::core::BuildMode;
use crate::graph::DependencyGraph;
use crate::log;

/// `asset:<path>` references in transformed content, rewritten to live under
/// the configured public base path.
static ASSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"asset:([A-Za-z0-9_\-./]+)").expect("asset pattern is valid"));

/// Assemble the bundle text. Pure function of (graph, config, mode).
pub fn assemble(graph: &DependencyGraph, config: &BuildConfig, mode: BuildMode) -> String {
    let tag = if mode.is_dev() { "development" } else { "production" };
    let mut out = format!("/* {} ({tag}) */\n", config.output.filename);

    let sections = graph
        .modules
        .iter()
        .filter(|(id, _)| **id != graph.entry_id)
        .chain(graph.modules.get_key_value(&graph.entry_id));

    for (id, module) in sections {
        out.push_str(&format!("\n// --- module: {id} ---\n"));
        let content = rewrite_asset_urls(&module.content, &config.output.public_path);
        out.push_str(&content);
        if !content.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Prefix `asset:` references with the public base path.
fn rewrite_asset_urls(content: &str, public_path: &str) -> String {
    let base = public_path.trim_end_matches('/');
    ASSET_RE
        .replace_all(content, |caps: &regex::Captures<'_>| {
            format!("{base}/{}", &caps[1])
        })
        .into_owned()
}

/// Assemble and write the bundle atomically. Returns the artifact path.
pub fn write_bundle(
    graph: &DependencyGraph,
    config: &BuildConfig,
    mode: BuildMode,
) -> Result<PathBuf> {
    let content = assemble(graph, config, mode);

    if mode.verbose_stats {
        for (id, module) in &graph.modules {
            log!("stats"; "{} ({} bytes)", id, module.content.len());
        }
    }

    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    let bundle_path = config.bundle_path();
    let tmp_path = bundle_path.with_extension("js.tmp");

    fs::write(&tmp_path, &content)
        .with_context(|| format!("failed to write {}", tmp_path.display()))?;
    fs::rename(&tmp_path, &bundle_path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp_path);
    })
    .with_context(|| format!("failed to move bundle into {}", bundle_path.display()))?;

    log!(
        "bundle";
        "{} ({} modules, {} bytes)",
        bundle_path.display(),
        graph.modules.len(),
        content.len()
    );
    Ok(bundle_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Module;
    use std::collections::BTreeMap;
    use std::path::Path;

    fn graph_of(entries: &[(&str, &str)], entry_id: &str) -> DependencyGraph {
        let modules: BTreeMap<String, Module> = entries
            .iter()
            .map(|(id, content)| {
                (
                    id.to_string(),
                    Module {
                        id: id.to_string(),
                        path: Path::new("/proj").join(id),
                        content: content.to_string(),
                    },
                )
            })
            .collect();
        DependencyGraph {
            modules,
            entry_id: entry_id.to_string(),
        }
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let graph = graph_of(
            &[("src/main.js", "main();"), ("src/a.js", "a();"), ("src/b.js", "b();")],
            "src/main.js",
        );
        let config = BuildConfig::default();
        let first = assemble(&graph, &config, BuildMode::PRODUCTION);
        let second = assemble(&graph, &config, BuildMode::PRODUCTION);
        assert_eq!(first, second);
    }

    #[test]
    fn test_entry_module_emitted_last() {
        let graph = graph_of(
            &[("src/main.js", "main();"), ("src/zz.js", "zz();")],
            "src/main.js",
        );
        let out = assemble(&graph, &BuildConfig::default(), BuildMode::PRODUCTION);
        let main_pos = out.find("module: src/main.js").unwrap();
        let zz_pos = out.find("module: src/zz.js").unwrap();
        assert!(zz_pos < main_pos);
    }

    #[test]
    fn test_asset_urls_prefixed_with_public_path() {
        let graph = graph_of(&[("src/main.js", "load(\"asset:img/logo.png\");")], "src/main.js");
        let mut config = BuildConfig::default();
        config.output.public_path = "/public".into();

        let out = assemble(&graph, &config, BuildMode::PRODUCTION);
        assert!(out.contains("load(\"/public/img/logo.png\")"));
        assert!(!out.contains("asset:"));
    }

    #[test]
    fn test_write_bundle_leaves_no_temp_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let graph = graph_of(&[("src/main.js", "main();")], "src/main.js");
        let mut config = BuildConfig::default();
        config.root = tmp.path().to_path_buf();

        let path = write_bundle(&graph, &config, BuildMode::PRODUCTION).unwrap();
        assert!(path.is_file());
        assert!(!path.with_extension("js.tmp").exists());
    }
}
