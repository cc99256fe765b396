//! Development server with proxy forwarding and auto-rebuild.
//!
//! Serve always runs in development mode: the bundle is built with
//! development symbols and the proxy router is live. Production deployments
//! serve the bundle statically from whatever hosts it; this server is never
//! the production path, so the router is simply never constructed outside
//! of here.

mod lifecycle;
mod path;
mod response;
mod watch;

use std::net::IpAddr;
use std::sync::Arc;

use anyhow::Result;
use crossbeam::channel;
use tiny_http::{Request, Server};

use crate::cli::build::build_bundle;
use crate::config::BuildConfig;
use crate::core::{BuildMode, is_healthy, is_shutdown, set_healthy};
use crate::proxy::{ProxyRouter, forward};
use crate::{debug, log};

/// CLI overrides for the `[serve]` section.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServeOverrides {
    pub interface: Option<IpAddr>,
    pub port: Option<u16>,
    pub watch: Option<bool>,
}

/// Build once, bind, then serve until shutdown.
pub fn serve(config: Arc<BuildConfig>, overrides: ServeOverrides) -> Result<()> {
    let interface = overrides.interface.unwrap_or(config.serve.interface);
    let port = overrides.port.unwrap_or(config.serve.port);
    let watch_enabled = overrides.watch.unwrap_or(config.serve.watch);

    // Proxy rules are materialized before the first request and never
    // change afterwards.
    let router = ProxyRouter::from_config(&config.proxy)?;
    if !router.is_empty() {
        debug!("proxy"; "{} forwarding rule(s) active", config.proxy.len());
    }

    let (server, addr) = lifecycle::bind_with_retry(interface, port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_server_for_shutdown(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);

    // Initial development build; on failure keep serving 503 until a watch
    // rebuild succeeds.
    match build_bundle(&config, BuildMode::DEVELOPMENT) {
        Ok(_) => set_healthy(true),
        Err(e) => log!("build"; "initial build failed: {:#}", e),
    }

    let watcher = lifecycle::spawn_watcher(Arc::clone(&config), watch_enabled, shutdown_rx);

    run_request_loop(&server, &config, &router);
    lifecycle::wait_for_shutdown(watcher);
    Ok(())
}

fn run_request_loop(server: &Server, config: &Arc<BuildConfig>, router: &ProxyRouter) {
    // Use a thread pool to handle requests concurrently so a slow backend
    // behind the proxy cannot block static file serving
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .expect("failed to create thread pool");

    for request in server.incoming_requests() {
        let config = Arc::clone(config);
        let router = router.clone();
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &config, &router) {
                log!("serve"; "request error: {e}");
            }
        });
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, config: &BuildConfig, router: &ProxyRouter) -> Result<()> {
    // Early exit if shutdown requested
    if is_shutdown() {
        return response::respond_unavailable(request);
    }

    // Proxy rules are consulted first, in declared order; no match means
    // the request is served from the bundle output.
    if let Some(decision) = router.route(request.url()) {
        debug!("proxy"; "{} -> {}", request.url(), decision.url);
        return forward::forward(request, &decision);
    }

    if let Some(file) = path::resolve_path(request.url(), &config.output_dir()) {
        return response::respond_file(request, &file);
    }

    if !is_healthy() {
        return response::respond_unavailable(request);
    }
    response::respond_not_found(request)
}
