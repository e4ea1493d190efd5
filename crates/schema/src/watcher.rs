//! Filesystem watcher that keeps the registry current with on-disk edits.
//!
//! A `notify` watcher forwards events into a channel; a dedicated tokio
//! task drains the channel and triggers [`SchemaRegistry::reload`], so
//! reloads never run on a request-handling path. Reloads are idempotent
//! and serialized by the registry, so a burst of events just produces a
//! few redundant passes; the last one to complete determines the live
//! snapshot.

use std::sync::Arc;

use notify::event::{CreateKind, ModifyKind, RemoveKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::registry::SchemaRegistry;

/// Watcher setup failure.
///
/// The registry keeps serving its last snapshot; schema edits just stop
/// being picked up until the process restarts.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("filesystem watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// Handle to the running watch loop.
pub struct SchemaWatcher {
    /// Held to keep the OS watch alive.
    _watcher: RecommendedWatcher,
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
}

impl SchemaWatcher {
    /// Attach a watch to the registry's schema directory and start the
    /// reload loop. Must be called from within a tokio runtime.
    pub fn spawn(registry: Arc<SchemaRegistry>) -> Result<Self, WatchError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if is_schema_event(&event) {
                        // Loop gone means shutdown; nothing left to notify.
                        let _ = tx.send(event);
                    }
                }
                Err(e) => warn!(error = %e, "filesystem watcher error"),
            },
        )?;
        // Non-recursive: one schema file per kind, flat directory.
        watcher.watch(registry.schemas_dir(), RecursiveMode::NonRecursive)?;
        info!(path = %registry.schemas_dir().display(), "watching schema directory for changes");

        let shutdown = Arc::new(Notify::new());
        let shutdown_rx = shutdown.clone();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = rx.recv() => match event {
                        Some(event) => {
                            debug!(kind = ?event.kind, paths = ?event.paths, "schema directory changed");
                            match registry.reload() {
                                Ok(report) => {
                                    info!(kinds = report.kinds.len(), "schemas reloaded");
                                }
                                Err(e) => {
                                    warn!(error = %e, "schema reload failed, keeping previous snapshot");
                                }
                            }
                        }
                        None => {
                            warn!("watch channel closed, stopping schema watcher");
                            break;
                        }
                    },
                    _ = shutdown_rx.notified() => {
                        info!("schema watcher shutting down");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            _watcher: watcher,
            shutdown,
            task,
        })
    }

    /// Stop the reload loop. The OS watch is dropped with `self`.
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        let _ = self.task.await;
    }
}

/// Create, data/name modify, and remove events on visible JSON files
/// warrant a reload.
fn is_schema_event(event: &Event) -> bool {
    let relevant = matches!(
        event.kind,
        EventKind::Create(CreateKind::File)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
            | EventKind::Remove(RemoveKind::File)
    );
    if !relevant {
        return false;
    }

    event.paths.iter().any(|path| {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e == "json")
            .unwrap_or(false);
        let visible = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| !n.starts_with('.'))
            .unwrap_or(false);
        is_json && visible
    })
}
