//! Build command driver.
//!
//! Ties the pipeline together: compile the rule set, walk the dependency
//! graph from the entry point, write the bundle. Any resolution or
//! transformation error aborts the whole build with no output written; the
//! error names the offending file and rule/loader.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;

use crate::bundle;
use crate::config::BuildConfig;
use crate::core::BuildMode;
use crate::graph;
use crate::loader::Registry;
use crate::log;
use crate::matcher::RuleSet;
use crate::resolver::Resolver;

/// Run one full build. Returns the bundle path.
pub fn build_bundle(config: &BuildConfig, mode: BuildMode) -> Result<PathBuf> {
    let started = Instant::now();
    log!(
        "build";
        "bundling for {}...",
        if mode.is_dev() { "development" } else { "production" }
    );

    let rules = RuleSet::compile(&config.rules)?;
    let resolver = Resolver::new(config);

    let graph = graph::build_graph(config, &rules, &resolver, Registry::builtin(), mode)?;
    let bundle_path = bundle::write_bundle(&graph, config, mode)?;

    log!("build"; "done in {:.0?}", started.elapsed());
    Ok(bundle_path)
}
