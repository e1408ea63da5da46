//! Coalesced model cache size updater
//!
//! Listens for "model changed" notifications and keeps the model cache large
//! enough for every open build. Notifications only schedule a size check on
//! an [`UpdateCoalescer`], so a burst of model reloads costs one or two
//! recomputations instead of one per project.

use crate::coalesce::{CoalescerConfig, CoalescerStats, UpdateCoalescer};
use crate::error::Result;
use crate::executor::TaskExecutor;
use anyhow::Context;
use modelcache_core::{take_snapshot, CacheSizeSink, Error, ProjectSource, SizeRequirements};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Receives notifications about recomputed or invalidated build models
pub trait ModelChangeListener: Send + Sync {
    fn on_model_changed(&self);
}

/// Keeps the model cache sized for the open projects
///
/// One instance is meant to be built at startup and shared by reference with
/// every project that reports model changes.
pub struct CoalescedSizeUpdater {
    check: Arc<SizeCheck>,
    coalescer: UpdateCoalescer,
}

/// What one size check read and applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Required slots per contributing build
    pub requirements: SizeRequirements,
    /// Open projects the snapshot looked at
    pub open_projects: usize,
    /// Open projects left out of the aggregation
    pub excluded_projects: usize,
}

impl CheckOutcome {
    /// Size handed to the cache size sink
    pub fn required_size(&self) -> u64 {
        self.requirements.total()
    }
}

struct SizeCheck {
    source: Arc<dyn ProjectSource>,
    sink: Arc<dyn CacheSizeSink>,
    // Keeps direct checks from overlapping coalesced ones
    running: Mutex<()>,
}

impl SizeCheck {
    fn run(&self) -> anyhow::Result<CheckOutcome> {
        let _running = self.running.lock();

        let projects = self.source.open_projects();
        let snapshot = take_snapshot(&projects);
        let requirements = snapshot.requirements();
        let required = requirements.total();

        debug!(
            "Cache size check: {} open projects, {} contributing builds, {} slots required",
            snapshot.project_count(),
            requirements.len(),
            required
        );

        self.sink
            .set_required_capacity(required)
            .with_context(|| format!("Failed to apply required cache size {}", required))?;

        Ok(CheckOutcome {
            requirements,
            open_projects: snapshot.project_count(),
            excluded_projects: snapshot.excluded,
        })
    }
}

impl CoalescedSizeUpdater {
    /// Create an updater with default coalescer settings
    pub fn new(
        executor: Arc<dyn TaskExecutor>,
        source: Arc<dyn ProjectSource>,
        sink: Arc<dyn CacheSizeSink>,
    ) -> Self {
        Self::from_parts(executor, source, sink, CoalescerConfig::default())
    }

    pub fn builder() -> CoalescedSizeUpdaterBuilder {
        CoalescedSizeUpdaterBuilder::default()
    }

    fn from_parts(
        executor: Arc<dyn TaskExecutor>,
        source: Arc<dyn ProjectSource>,
        sink: Arc<dyn CacheSizeSink>,
        config: CoalescerConfig,
    ) -> Self {
        let check = Arc::new(SizeCheck {
            source,
            sink,
            running: Mutex::new(()),
        });

        let task_check = Arc::clone(&check);
        let coalescer = UpdateCoalescer::with_config(executor, config, move || {
            task_check.run().map(|_| ())
        });

        Self { check, coalescer }
    }

    /// Run a size check right away on the calling thread
    ///
    /// Waits for a coalesced check in progress. Returns what the check saw,
    /// including the required size that was applied.
    pub fn check_cache_size(&self) -> anyhow::Result<CheckOutcome> {
        self.check.run()
    }

    /// Request counters of the underlying coalescer
    pub fn stats(&self) -> CoalescerStats {
        self.coalescer.stats()
    }

    /// Wait until no coalesced check is scheduled or running
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.coalescer.wait_idle(timeout)
    }
}

impl ModelChangeListener for CoalescedSizeUpdater {
    fn on_model_changed(&self) {
        self.coalescer.schedule();
    }
}

/// Builder validating that every collaborator is wired
#[derive(Default)]
pub struct CoalescedSizeUpdaterBuilder {
    executor: Option<Arc<dyn TaskExecutor>>,
    source: Option<Arc<dyn ProjectSource>>,
    sink: Option<Arc<dyn CacheSizeSink>>,
    config: CoalescerConfig,
}

impl CoalescedSizeUpdaterBuilder {
    /// Executor running the coalesced checks
    pub fn executor(mut self, executor: Arc<dyn TaskExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Host query for the open projects
    pub fn project_source(mut self, source: Arc<dyn ProjectSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Callback receiving the required cache size
    pub fn cache_size_sink(mut self, sink: Arc<dyn CacheSizeSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.config.settle_delay = delay;
        self
    }

    /// Build the updater, failing on a missing collaborator
    pub fn build(self) -> Result<CoalescedSizeUpdater> {
        let executor = self.executor.ok_or(Error::MissingCollaborator("executor"))?;
        let source = self.source.ok_or(Error::MissingCollaborator("project_source"))?;
        let sink = self.sink.ok_or(Error::MissingCollaborator("cache_size_sink"))?;

        Ok(CoalescedSizeUpdater::from_parts(executor, source, sink, self.config))
    }
}
