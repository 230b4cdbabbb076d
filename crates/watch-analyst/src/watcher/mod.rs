//! Directory Watcher.
//!
//! Subscribes to creation events in one directory (non-recursive) and hands
//! each new file to a [`FileHandler`], one at a time. Per-file errors are
//! logged and the loop keeps going; only a broken notification channel or
//! a cancelled [`CancellationToken`] ends [`DirectoryWatcher::run`].

mod cancellation;
mod state;

pub use cancellation::CancellationToken;
pub use state::ProcessedFileSet;

use crate::error::{AnalysisError, Result};
use crate::loader::is_supported;
use crate::processor::FileProcessor;
use notify::event::CreateKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{RecvTimeoutError, channel};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// How often the loop wakes up to check for cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Time between size checks while a new file is still being written.
const STABILITY_CHECK_INTERVAL: Duration = Duration::from_millis(250);

/// Consecutive unchanged size checks before a file counts as complete.
const STABILITY_REQUIRED_CHECKS: u32 = 2;

/// Give up waiting for a file to settle after this long and process it anyway.
const STABILITY_TIMEOUT: Duration = Duration::from_secs(30);

/// A filesystem creation event, consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    pub is_directory: bool,
}

impl WatchEvent {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_directory: false,
        }
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_directory: true,
        }
    }

    /// Creation events carried by a notify event; other kinds yield nothing.
    pub fn from_notify(event: &Event) -> Vec<WatchEvent> {
        let EventKind::Create(kind) = &event.kind else {
            return Vec::new();
        };
        event
            .paths
            .iter()
            .map(|path| WatchEvent {
                path: path.clone(),
                is_directory: matches!(kind, CreateKind::Folder) || path.is_dir(),
            })
            .collect()
    }
}

/// Something the watcher can hand a new file to.
pub trait FileHandler {
    fn handle_file(&self, path: &Path) -> Result<()>;
}

impl FileHandler for FileProcessor {
    fn handle_file(&self, path: &Path) -> Result<()> {
        self.process(path).map(|_| ())
    }
}

/// What happened to a single event.
#[derive(Debug)]
pub enum EventOutcome {
    IgnoredDirectory,
    AlreadyProcessed,
    Processed,
    /// The handler failed; the path stays eligible for a later creation event.
    Failed(AnalysisError),
}

/// Watches one directory and dispatches new files to a handler.
pub struct DirectoryWatcher<H> {
    directory: PathBuf,
    handler: H,
    processed: ProcessedFileSet,
}

impl<H: FileHandler> DirectoryWatcher<H> {
    pub fn new(directory: impl Into<PathBuf>, handler: H) -> Self {
        Self {
            directory: directory.into(),
            handler,
            processed: ProcessedFileSet::new(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn processed(&self) -> &ProcessedFileSet {
        &self.processed
    }

    /// Handle one event synchronously.
    pub fn handle_event(&mut self, event: &WatchEvent) -> EventOutcome {
        if event.is_directory {
            debug!(path = %event.path.display(), "Ignoring directory");
            return EventOutcome::IgnoredDirectory;
        }
        if self.processed.contains(&event.path) {
            debug!(path = %event.path.display(), "Already processed, ignoring");
            return EventOutcome::AlreadyProcessed;
        }

        info!("New file detected: {}", event.path.display());
        match self.handler.handle_file(&event.path) {
            Ok(()) => {
                self.processed.insert(event.path.clone());
                EventOutcome::Processed
            }
            Err(e) => {
                error!(
                    path = %event.path.display(),
                    code = e.error_code(),
                    "Failed to process file: {}",
                    e
                );
                EventOutcome::Failed(e)
            }
        }
    }

    /// Whether to wait for the file to stop growing before handing it over.
    ///
    /// Only new files the loader can read are worth waiting for; anything
    /// else is rejected by the handler straight away.
    fn needs_settling(&self, event: &WatchEvent) -> bool {
        !event.is_directory
            && !self.processed.contains(&event.path)
            && is_supported(&event.path)
    }

    /// Watch until `token` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Watch`] if the OS watcher cannot be created
    /// or attached, or if its event channel closes unexpectedly.
    pub fn run(&mut self, token: &CancellationToken) -> Result<()> {
        let (tx, rx) = channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&self.directory, RecursiveMode::NonRecursive)?;

        info!("Watching {} for new files", self.directory.display());

        while !token.is_cancelled() {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(Ok(event)) => {
                    for watch_event in WatchEvent::from_notify(&event) {
                        if self.needs_settling(&watch_event) {
                            wait_until_stable(&watch_event.path, token);
                        }
                        self.handle_event(&watch_event);
                        if token.is_cancelled() {
                            break;
                        }
                    }
                }
                Ok(Err(e)) => warn!(error = %e, "Watcher reported an error"),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(AnalysisError::Watch(
                        "notification channel closed".to_string(),
                    ));
                }
            }
        }

        info!(processed = self.processed.len(), "Watcher stopped");
        Ok(())
    }
}

/// Block until the file size stops changing, the timeout passes or `token` is cancelled.
fn wait_until_stable(path: &Path, token: &CancellationToken) {
    let start = Instant::now();
    let mut last_size = None;
    let mut unchanged = 0;

    while start.elapsed() < STABILITY_TIMEOUT {
        if token.is_cancelled() {
            return;
        }
        let size = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            // Gone or unreadable; let the handler report it.
            Err(_) => return,
        };
        if last_size == Some(size) {
            unchanged += 1;
            if unchanged >= STABILITY_REQUIRED_CHECKS {
                return;
            }
        } else {
            unchanged = 0;
            last_size = Some(size);
        }
        std::thread::sleep(STABILITY_CHECK_INTERVAL);
    }

    warn!(path = %path.display(), "File still changing, processing anyway");
}
