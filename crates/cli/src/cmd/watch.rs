//! Watch a workspace and keep the cache sized
//!
//! Wires the single shared updater: one worker lane, one capacity holder and
//! the filesystem workspace, built once here and handed to the change source.

use anyhow::{Context, Result};
use modelcache_cli::config;
use modelcache_cli::source::ChangeSource;
use modelcache_cli::workspace::{FsWorkspace, SkipRules};
use modelcache_core::{CacheCapacity, CacheSizeSink};
use modelcache_watcher::{CoalescedSizeUpdater, ModelChangeListener, WorkerLane};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// How long shutdown waits for an in-flight size check
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Applies sizes to the capacity holder and reports changes on stdout
struct ReportingSink {
    capacity: Arc<CacheCapacity>,
    last: Mutex<Option<u64>>,
}

impl CacheSizeSink for ReportingSink {
    fn set_required_capacity(&self, size: u64) -> Result<()> {
        let before = self.capacity.capacity();
        let after = self.capacity.apply(size);

        let previous = self.last.lock().replace(size);

        if previous != Some(size) || before != after {
            println!(
                "{} required {} -> capacity {}",
                "•".cyan(),
                size.bold(),
                after.green()
            );
        }
        Ok(())
    }
}

pub fn run(dir: &Path, config_path: Option<&Path>, duration: Option<u64>) -> Result<()> {
    let config = config::load(config_path)?;
    let root = dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", dir.display()))?;

    let workspace = Arc::new(FsWorkspace::new(root.clone(), config.scan.clone()));
    let capacity = Arc::new(CacheCapacity::new(config.cache.policy, config.cache.bounds())?);
    let lane = WorkerLane::spawn(config.coalescer.lane_name.clone())?;
    info!("Size checks run on worker lane '{}'", lane.name());

    let updater = CoalescedSizeUpdater::builder()
        .executor(Arc::new(lane))
        .project_source(workspace)
        .cache_size_sink(Arc::new(ReportingSink {
            capacity: Arc::clone(&capacity),
            last: Mutex::new(None),
        }))
        .name("model-cache-size")
        .settle_delay(config.coalescer.settle_delay())
        .build()?;

    let skip = SkipRules::new(config.scan.skip_dirs.clone());
    let source = ChangeSource::watch(&root, skip)?;

    println!("{} {}", "Watching".bold(), root.display());
    info!("Watching {} for build changes", root.display());

    // Size once for the builds already present
    updater.on_model_changed();

    let notified = source.run(&updater, duration.map(Duration::from_secs));

    if !updater.wait_idle(SHUTDOWN_GRACE) {
        println!("{}", "Size check still running at shutdown".yellow());
    }

    let stats = updater.stats();
    println!(
        "\n{}: {} notifications, {} size checks, {} coalesced, {} failed",
        "Summary".bold(),
        notified + 1,
        stats.runs,
        stats.coalesced,
        stats.failures
    );
    println!("{}: {}", "Final cache capacity".bold(), capacity.capacity().green());

    Ok(())
}
