//! System configuration for mcache
//!
//! Loaded from `--config <FILE>` when given, otherwise from
//! `<config dir>/modelcache/config.toml` if that file exists. A missing file
//! means defaults everywhere.

use anyhow::{Context, Result};
use modelcache_core::{CapacityBounds, CapacityPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Validation failures for configuration values
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{key} = {value} is out of range ({min}-{max})")]
    OutOfRange {
        key: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error(transparent)]
    Capacity(#[from] modelcache_core::Error),
}

/// Full configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub coalescer: CoalescerSection,
    pub cache: CacheSection,
    pub scan: ScanSection,
}

/// `[coalescer]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoalescerSection {
    /// Delay before a scheduled size check runs (default: 0)
    pub settle_delay_ms: u64,
    /// Name of the worker lane thread
    pub lane_name: String,
}

impl Default for CoalescerSection {
    fn default() -> Self {
        Self {
            settle_delay_ms: 0,
            lane_name: "model-cache-size".to_string(),
        }
    }
}

impl CoalescerSection {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// `[cache]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub policy: CapacityPolicy,
    pub min_capacity: u64,
    /// 0 = unbounded
    pub max_capacity: u64,
}

impl CacheSection {
    pub fn bounds(&self) -> CapacityBounds {
        CapacityBounds {
            min_capacity: self.min_capacity,
            max_capacity: self.max_capacity,
        }
    }
}

/// `[scan]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSection {
    /// How deep below the workspace root to look for builds
    pub max_depth: usize,
    /// Directory names never descended into
    pub skip_dirs: Vec<String>,
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            max_depth: 8,
            skip_dirs: [".git", ".gradle", "build", "node_modules", "target"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl SystemConfig {
    /// Check every value against its valid range
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range(
            "coalescer.settle_delay_ms",
            self.coalescer.settle_delay_ms,
            0,
            60_000,
        )?;
        if self.coalescer.lane_name.trim().is_empty() {
            return Err(ConfigError::Empty("coalescer.lane_name"));
        }
        check_range("scan.max_depth", self.scan.max_depth as u64, 1, 64)?;
        self.cache.bounds().validate()?;
        Ok(())
    }

    /// Parse and validate configuration text
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: SystemConfig = toml::from_str(text).context("Failed to parse config")?;
        config.validate().context("Invalid configuration value")?;
        Ok(config)
    }
}

fn check_range(key: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            key,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Default location of the configuration file
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("modelcache").join("config.toml"))
}

/// Load configuration
///
/// An explicit path must exist. The default path is optional.
pub fn load(explicit: Option<&Path>) -> Result<SystemConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match config_file_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(SystemConfig::default()),
        },
    };

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    SystemConfig::from_toml(&text).with_context(|| format!("In config file {}", path.display()))
}

/// Example configuration file with every key at its default
pub fn example_config() -> &'static str {
    r#"# mcache configuration

[coalescer]
# Delay before a scheduled size check runs, in milliseconds (0-60000)
settle_delay_ms = 0
# Name of the worker lane thread
lane_name = "model-cache-size"

[cache]
# grow: capacity never shrinks; exact: capacity follows the requirement
policy = "grow"
min_capacity = 0
# 0 = unbounded
max_capacity = 0

[scan]
# How deep below the workspace root to look for builds (1-64)
max_depth = 8
skip_dirs = [".git", ".gradle", "build", "node_modules", "target"]
"#
}
