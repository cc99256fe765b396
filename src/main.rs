//! Fardel - an asset bundling pipeline with a dev proxy.

#![allow(dead_code)]

mod bundle;
mod cli;
mod config;
mod core;
mod graph;
mod loader;
mod logger;
mod matcher;
mod proxy;
mod resolver;
mod utils;

use std::sync::Arc;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::BuildConfig;
use crate::core::BuildMode;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    crate::core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    // Loaded once, read-only thereafter; threaded explicitly into every
    // consumer (the serve request loop shares it across worker threads).
    let config = Arc::new(BuildConfig::load(&cli)?);

    match &cli.command {
        Commands::Build { build_args } => {
            // Mode is derived exactly once per invocation and threaded into
            // every loader call; it never changes mid-build.
            let mode = BuildMode::from_flags(build_args.production);
            cli::build::build_bundle(&config, mode).map(|_| ())
        }
        Commands::Serve {
            interface,
            port,
            watch,
        } => cli::serve::serve(
            config,
            cli::serve::ServeOverrides {
                interface: *interface,
                port: *port,
                watch: *watch,
            },
        ),
    }
}
