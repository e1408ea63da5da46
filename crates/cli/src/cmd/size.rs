//! One-shot cache size computation

use anyhow::{Context, Result};
use modelcache_cli::config;
use modelcache_cli::workspace::FsWorkspace;
use modelcache_core::{CacheCapacity, SizeRequirements};
use modelcache_watcher::{CoalescedSizeUpdater, InlineExecutor};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// JSON report of one size computation
#[derive(Serialize)]
struct SizeReport {
    root: PathBuf,
    builds: SizeRequirements,
    open_projects: usize,
    excluded_projects: usize,
    required_size: u64,
    capacity: u64,
}

pub fn run(dir: &Path, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = config::load(config_path)?;
    let root = dir
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", dir.display()))?;

    let capacity = Arc::new(CacheCapacity::new(config.cache.policy, config.cache.bounds())?);
    let updater = CoalescedSizeUpdater::builder()
        .executor(Arc::new(InlineExecutor))
        .project_source(Arc::new(FsWorkspace::new(root.clone(), config.scan.clone())))
        .cache_size_sink(capacity.clone())
        .name("model-cache-size")
        .build()?;

    let outcome = updater.check_cache_size()?;
    let required_size = outcome.required_size();
    let applied = capacity.capacity();

    if json {
        let report = SizeReport {
            root,
            builds: outcome.requirements,
            open_projects: outcome.open_projects,
            excluded_projects: outcome.excluded_projects,
            required_size,
            capacity: applied,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let builds = &outcome.requirements;
    if builds.is_empty() {
        println!("{}", "No Gradle builds found".yellow());
    } else {
        println!("{} ({})", "Builds".bold(), builds.len());
        for (key, slots) in builds.iter() {
            println!("  {}  {} slots", key.cyan(), slots);
        }
    }

    println!(
        "\n{}: {} ({} excluded)",
        "Open projects".dimmed(),
        outcome.open_projects,
        outcome.excluded_projects
    );
    println!("{}: {}", "Required cache size".bold(), required_size.green());
    if applied != required_size {
        println!("{}: {}", "Cache capacity".bold(), applied);
    }

    Ok(())
}
