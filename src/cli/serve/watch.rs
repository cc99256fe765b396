//! File watching for auto-rebuild.
//!
//! A thin wrapper over notify: watch the project tree, debounce bursts of
//! events, rebuild the bundle. A failed rebuild keeps the last good bundle
//! on disk and flips the health flag so requests get a clear 503 only when
//! there has never been a good build.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use crossbeam::channel::{Receiver, select, unbounded};
use notify::{Event, RecursiveMode, Watcher};

use crate::cli::build::build_bundle;
use crate::config::BuildConfig;
use crate::core::{BuildMode, is_shutdown, set_healthy};
use crate::logger::{status_error, status_success};

/// Quiet period after the last event before a rebuild starts.
const DEBOUNCE: Duration = Duration::from_millis(200);

/// Watch loop. Returns when shutdown is signalled.
pub fn run_watch(config: &BuildConfig, shutdown_rx: &Receiver<()>) -> Result<()> {
    let (tx, events) = unbounded::<Event>();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;
    watcher.watch(&config.root, RecursiveMode::Recursive)?;

    let output_dir = config.output_dir();

    loop {
        select! {
            recv(events) -> event => {
                let Ok(event) = event else { return Ok(()) };
                if !is_relevant(&event, &output_dir) {
                    continue;
                }
                drain_quiet_period(&events);
                if is_shutdown() {
                    return Ok(());
                }
                rebuild(config);
            }
            recv(shutdown_rx) -> _ => return Ok(()),
        }
    }
}

/// Swallow follow-up events until the tree has been quiet for `DEBOUNCE`.
/// Relevance does not matter once a rebuild is already due.
fn drain_quiet_period(events: &Receiver<Event>) {
    while events.recv_timeout(DEBOUNCE).is_ok() {}
}

/// Ignore events from the output directory (our own writes) and from
/// editor/VCS internals.
fn is_relevant(event: &Event, output_dir: &Path) -> bool {
    event.paths.iter().any(|path| {
        !path.starts_with(output_dir)
            && !path
                .components()
                .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
    })
}

fn rebuild(config: &BuildConfig) {
    // Serve always builds for development.
    match build_bundle(config, BuildMode::DEVELOPMENT) {
        Ok(path) => {
            set_healthy(true);
            status_success(&format!("rebuilt {}", path.display()));
        }
        Err(e) => {
            status_error("rebuild failed", &format!("{e:#}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::EventKind;
    use std::path::PathBuf;

    fn event_for(path: &str) -> Event {
        Event {
            kind: EventKind::Modify(notify::event::ModifyKind::Any),
            paths: vec![PathBuf::from(path)],
            attrs: Default::default(),
        }
    }

    #[test]
    fn test_output_dir_events_ignored() {
        let output = PathBuf::from("/proj/public");
        assert!(!is_relevant(&event_for("/proj/public/bundle.js"), &output));
        assert!(is_relevant(&event_for("/proj/src/main.js"), &output));
    }

    #[test]
    fn test_hidden_path_events_ignored() {
        let output = PathBuf::from("/proj/public");
        assert!(!is_relevant(&event_for("/proj/.git/index"), &output));
    }
}
