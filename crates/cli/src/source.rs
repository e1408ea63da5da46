//! Filesystem change source raising "model changed"
//!
//! Watches the workspace recursively and turns edits of build definitions
//! into model change notifications. Everything else (sources, outputs under
//! skipped directories) is ignored.

use crate::workspace::{is_build_definition, SkipRules};
use anyhow::{Context, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use modelcache_watcher::ModelChangeListener;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long `run` waits for an event before checking its deadline again
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Recursive watcher over a workspace root
pub struct ChangeSource {
    // Dropping the watcher stops event delivery
    _watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
    root: PathBuf,
    skip: SkipRules,
}

impl ChangeSource {
    /// Start watching `root`
    pub fn watch(root: &Path, skip: SkipRules) -> Result<Self> {
        let (tx, rx) = unbounded();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = tx.send(res);
            },
            Config::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", root.display()))?;

        Ok(Self {
            _watcher: watcher,
            events: rx,
            root: root.to_path_buf(),
            skip,
        })
    }

    /// Whether an event may change a build model
    pub fn is_relevant(&self, event: &Event) -> bool {
        if matches!(event.kind, EventKind::Access(_)) {
            return false;
        }
        event.paths.iter().any(|path| self.is_relevant_path(path))
    }

    fn is_relevant_path(&self, path: &Path) -> bool {
        if self.skip.should_ignore(&self.root, path) {
            return false;
        }

        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(is_build_definition)
    }

    /// Forward relevant events to `listener` until `duration` elapses
    ///
    /// Without a duration, runs until the watcher goes away. Returns the
    /// number of notifications sent.
    pub fn run(&self, listener: &dyn ModelChangeListener, duration: Option<Duration>) -> u64 {
        let deadline = duration.map(|d| Instant::now() + d);
        let mut notified = 0u64;

        loop {
            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    (deadline - now).min(POLL_INTERVAL)
                }
                None => POLL_INTERVAL,
            };

            match self.events.recv_timeout(wait) {
                Ok(Ok(event)) => {
                    if self.is_relevant(&event) {
                        debug!("Build definition changed: {:?}", event.paths);
                        listener.on_model_changed();
                        notified += 1;
                    }
                }
                Ok(Err(e)) => warn!("File watcher error: {}", e),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        notified
    }
}
