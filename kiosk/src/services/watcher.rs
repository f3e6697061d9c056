//! Ingestion watcher: turns directory notifications into print jobs.
//!
//! Policies applied to every notification:
//! - only files with a `jpg`, `jpeg` or `png` extension (any case) count,
//!   directory creation is ignored;
//! - each path is dispatched at most once for the lifetime of the process.
//!   The seen-set is never evicted, so memory grows with the number of
//!   distinct photos; fine for a kiosk, not for an archive importer.
//!
//! Jobs are queued, never dropped; the print queue worker runs them one at
//! a time in arrival order.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::print_queue::PrintJob;

/// File extensions (lowercase) the kiosk will print.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// A filesystem notification relevant to ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A file appeared in the watched directory.
    Created(PathBuf),
    /// A directory appeared in the watched directory.
    DirectoryCreated(PathBuf),
}

/// Whether `path` has one of the [`ALLOWED_EXTENSIONS`], ignoring case.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// Map a raw `notify` event onto ingestion events.
///
/// A rename whose target lands in the directory counts as a creation: camera
/// tools often write to a temp name and move the finished file in.
pub fn translate_event(event: Event) -> Vec<WatchEvent> {
    match event.kind {
        EventKind::Create(CreateKind::Folder) => event
            .paths
            .into_iter()
            .map(WatchEvent::DirectoryCreated)
            .collect(),
        EventKind::Create(_) => event
            .paths
            .into_iter()
            .map(|path| {
                if path.is_dir() {
                    WatchEvent::DirectoryCreated(path)
                } else {
                    WatchEvent::Created(path)
                }
            })
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            event.paths.into_iter().map(WatchEvent::Created).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => event
            .paths
            .into_iter()
            .last()
            .map(WatchEvent::Created)
            .into_iter()
            .collect(),
        _ => Vec::new(),
    }
}

/// Subscribe to `dir` (non-recursive).
///
/// Events are forwarded into an unbounded channel so the notify callback
/// never blocks. Dropping the returned watcher unsubscribes.
pub fn subscribe(
    dir: &Path,
) -> Result<(RecommendedWatcher, mpsc::UnboundedReceiver<WatchEvent>), notify::Error> {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            for ev in translate_event(event) {
                if tx.send(ev).is_err() {
                    return;
                }
            }
        }
        Err(e) => tracing::warn!(error = %e, "Filesystem watch error"),
    })?;
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    tracing::info!(dir = %dir.display(), "Watching directory for new photos");
    Ok((watcher, rx))
}

/// Whether a pipeline run is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatchPhase {
    #[default]
    Idle,
    Dispatching,
}

/// Process-lifetime ingestion state. Never persisted.
#[derive(Debug, Default)]
pub struct WatchState {
    dispatched: HashSet<PathBuf>,
    phase: WatchPhase,
}

impl WatchState {
    /// Record `path`; true only the first time it is seen.
    pub fn mark_dispatched(&mut self, path: &Path) -> bool {
        self.dispatched.insert(path.to_path_buf())
    }

    pub fn dispatched_count(&self) -> usize {
        self.dispatched.len()
    }

    pub fn phase(&self) -> WatchPhase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: WatchPhase) {
        self.phase = phase;
    }
}

/// [`WatchState`] shared between the ingestion loop and the worker.
#[derive(Debug, Clone, Default)]
pub struct SharedWatchState(Arc<Mutex<WatchState>>);

impl SharedWatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with the state locked. A poisoned lock is recovered.
    pub fn with<R>(&self, f: impl FnOnce(&mut WatchState) -> R) -> R {
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }

    pub fn phase(&self) -> WatchPhase {
        self.with(|s| s.phase())
    }

    pub fn dispatched_count(&self) -> usize {
        self.with(|s| s.dispatched_count())
    }
}

/// Filters and dedupes notifications, then queues print jobs.
#[derive(Debug, Clone)]
pub struct IngestionWatcher {
    state: SharedWatchState,
    jobs: mpsc::Sender<PrintJob>,
}

impl IngestionWatcher {
    pub fn new(state: SharedWatchState, jobs: mpsc::Sender<PrintJob>) -> Self {
        Self { state, jobs }
    }

    /// Apply the extension filter and at-most-once policy.
    ///
    /// Returns the path to dispatch, or `None` if the event is ignored.
    pub fn accept(&self, event: WatchEvent) -> Option<PathBuf> {
        let path = match event {
            WatchEvent::Created(path) => path,
            WatchEvent::DirectoryCreated(path) => {
                tracing::debug!(path = %path.display(), "Ignoring new directory");
                return None;
            }
        };

        if !is_supported_image(&path) {
            tracing::debug!(path = %path.display(), "Ignoring unsupported file");
            return None;
        }

        if !self.state.with(|s| s.mark_dispatched(&path)) {
            tracing::debug!(path = %path.display(), "Already dispatched, skipping");
            return None;
        }

        Some(path)
    }

    /// Accept and queue one event. Returns false if the queue is closed.
    pub async fn handle_event(&self, event: WatchEvent) -> bool {
        let Some(path) = self.accept(event) else {
            return true;
        };

        tracing::info!(path = %path.display(), "New photo detected");
        let job = PrintJob {
            source: path,
            observed_at: Utc::now(),
        };
        if let Err(e) = self.jobs.send(job).await {
            tracing::error!(path = %e.0.source.display(), "Print queue closed, dropping job");
            return false;
        }
        true
    }

    /// Forward events until cancelled or the source closes.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<WatchEvent>, token: CancellationToken) {
        loop {
            let event = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                event = events.recv() => event,
            };
            let Some(event) = event else {
                tracing::warn!("Filesystem event source closed");
                break;
            };
            if !self.handle_event(event).await {
                break;
            }
        }
        tracing::info!("Ingestion watcher stopped");
    }
}
