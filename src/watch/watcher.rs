// src/watch/watcher.rs

use anyhow::Context;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::errors::Result;
use crate::watch::path_utils::WatchedPath;

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Install one non-recursive watch per path and forward every notify event
/// into the returned channel.
pub fn spawn_path_watcher(
    paths: &[WatchedPath],
) -> Result<(WatcherHandle, mpsc::UnboundedReceiver<Event>)> {
    // Channel from the blocking notify callback into the async world.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                // Receiver gone means the watch session is over.
                let _ = event_tx.send(event);
            }
            Err(err) => warn!(error = %err, "file watch error"),
        },
        Config::default(),
    )?;

    for path in paths {
        watcher
            .watch(&path.absolute, RecursiveMode::NonRecursive)
            .with_context(|| format!("watching {}", path.absolute.display()))?;
    }
    info!(count = paths.len(), "file watcher started");

    Ok((WatcherHandle { _inner: watcher }, event_rx))
}
