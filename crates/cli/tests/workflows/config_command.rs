//! `mcache config` and configuration loading

use crate::common::TestWorkspace;
use crate::mcache;
use anyhow::Result;

#[test]
fn test_example_config_round_trips() -> Result<()> {
    let ws = TestWorkspace::new()?;

    let example = mcache!(ws.path(), "config", "--example").assert_success()?;
    assert!(example.contains_stdout("[coalescer]"));
    assert!(example.contains_stdout("[cache]"));
    assert!(example.contains_stdout("[scan]"));

    // The printed example must itself be a valid configuration
    ws.write("example.toml", &example.stdout)?;
    let path = ws.path().join("example.toml").display().to_string();
    let shown = mcache!(ws.path(), "--config", path.as_str(), "config").assert_success()?;
    assert!(shown.contains_stdout("settle_delay_ms"));
    assert!(shown.contains_stdout("model-cache-size"));

    Ok(())
}

#[test]
fn test_config_without_file_uses_defaults() -> Result<()> {
    let ws = TestWorkspace::new()?;

    let result = mcache!(ws.path(), "config").assert_success()?;
    assert!(result.contains_stdout("defaults"));
    assert!(result.contains_stdout("grow"));

    Ok(())
}

#[test]
fn test_config_path_points_into_config_dir() -> Result<()> {
    let ws = TestWorkspace::new()?;

    let result = mcache!(ws.path(), "config", "--path").assert_success()?;
    assert!(result.contains_stdout("config.toml"));

    Ok(())
}

#[test]
fn test_out_of_range_config_is_rejected() -> Result<()> {
    let ws = TestWorkspace::new()?;
    ws.add_build("alpha", &["app"])?;
    ws.write("bad.toml", "[coalescer]\nsettle_delay_ms = 999999\n")?;

    let path = ws.path().join("bad.toml").display().to_string();
    let result = mcache!(ws.path(), "--config", path.as_str(), "size").assert_failure()?;
    assert!(result.contains_stderr("settle_delay_ms"));

    Ok(())
}

#[test]
fn test_inverted_capacity_bounds_are_rejected() -> Result<()> {
    let ws = TestWorkspace::new()?;
    ws.write("bad.toml", "[cache]\nmin_capacity = 10\nmax_capacity = 2\n")?;

    let path = ws.path().join("bad.toml").display().to_string();
    let result = mcache!(ws.path(), "--config", path.as_str(), "config").assert_failure()?;
    assert!(result.contains_stderr("min 10 exceeds max 2"));

    Ok(())
}
