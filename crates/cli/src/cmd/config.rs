//! Configuration command
//!
//! Shows the effective configuration, where it is read from, or an example.

use anyhow::{Context, Result};
use modelcache_cli::config::{self, SystemConfig};
use modelcache_core::CapacityPolicy;
use owo_colors::OwoColorize;
use std::path::Path;

/// Print every configuration value
pub fn run_show(explicit: Option<&Path>) -> Result<()> {
    let config = config::load(explicit)?;

    println!("{}", "Effective Configuration".bold());
    match explicit.map(Path::to_path_buf).or_else(config::config_file_path) {
        Some(path) if path.exists() => {
            println!("{}: {}\n", "Location".dimmed(), path.display().dimmed())
        }
        _ => println!("{}\n", "Location: defaults (no config file)".dimmed()),
    }

    print_config(&config);

    println!("\n{}", "Valid Ranges:".bold());
    println!("  settle_delay_ms: 0-60000");
    println!("  max_depth: 1-64");
    println!("  min_capacity <= max_capacity (max_capacity 0 = unbounded)");

    Ok(())
}

fn print_config(config: &SystemConfig) {
    println!("{}", "[coalescer]".yellow());
    println!(
        "  {} = {} {}",
        "settle_delay_ms".cyan(),
        config.coalescer.settle_delay_ms,
        if config.coalescer.settle_delay_ms == 0 {
            "(run immediately)".dimmed().to_string()
        } else {
            format!("({:?})", config.coalescer.settle_delay()).dimmed().to_string()
        }
    );
    println!("  {} = {:?}", "lane_name".cyan(), config.coalescer.lane_name);

    println!("\n{}", "[cache]".yellow());
    let policy = match config.cache.policy {
        CapacityPolicy::Grow => "grow",
        CapacityPolicy::Exact => "exact",
    };
    println!("  {} = {:?}", "policy".cyan(), policy);
    println!("  {} = {}", "min_capacity".cyan(), config.cache.min_capacity);
    println!(
        "  {} = {} {}",
        "max_capacity".cyan(),
        config.cache.max_capacity,
        if config.cache.max_capacity == 0 {
            "(unbounded)".dimmed().to_string()
        } else {
            String::new()
        }
    );

    println!("\n{}", "[scan]".yellow());
    println!("  {} = {}", "max_depth".cyan(), config.scan.max_depth);
    println!("  {} = {:?}", "skip_dirs".cyan(), config.scan.skip_dirs);
}

/// Print the default configuration file path
pub fn run_path() -> Result<()> {
    let config_path = config::config_file_path().context("Could not determine config file path")?;

    println!("{}", config_path.display());
    if !config_path.exists() {
        println!(
            "{}",
            "File does not exist. Use 'mcache config --example' for a starting point.".yellow()
        );
    }

    Ok(())
}

/// Print an example configuration file
pub fn run_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}
