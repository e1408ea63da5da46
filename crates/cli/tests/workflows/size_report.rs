//! `mcache size` over fixture workspaces

use crate::common::TestWorkspace;
use crate::mcache;
use anyhow::Result;

#[test]
fn test_size_json_sums_builds() -> Result<()> {
    let ws = TestWorkspace::new()?;
    ws.add_build("alpha", &["app", "lib"])?;
    ws.add_build("beta", &["core"])?;

    let result = mcache!(ws.path(), "size", "--json").assert_success()?;
    let report = result.json()?;

    // alpha: root + 2 modules + buildSrc slot, beta: root + 1 module + buildSrc slot
    assert_eq!(report["required_size"], 7);
    assert_eq!(report["capacity"], 7);
    assert_eq!(report["excluded_projects"], 0);

    let builds = report["builds"].as_object().expect("builds is a map");
    assert_eq!(builds.len(), 2);
    let alpha = ws.root().join("alpha").display().to_string();
    assert_eq!(builds[&alpha], 4);

    Ok(())
}

#[test]
fn test_size_empty_directory_is_zero() -> Result<()> {
    let ws = TestWorkspace::new()?;

    let result = mcache!(ws.path(), "size", "--json").assert_success()?;
    let report = result.json()?;

    assert_eq!(report["required_size"], 0);
    assert_eq!(report["open_projects"], 0);
    assert!(report["builds"].as_object().is_some_and(|b| b.is_empty()));

    let text = mcache!(ws.path(), "size").assert_success()?;
    assert!(text.contains_stdout("No Gradle builds found"));

    Ok(())
}

#[test]
fn test_size_ignores_skipped_directories() -> Result<()> {
    let ws = TestWorkspace::new()?;
    ws.add_build("alpha", &["app"])?;
    ws.write("alpha/build/generated/settings.gradle", "include 'ghost'\n")?;
    ws.write("node_modules/pkg/settings.gradle", "include 'ghost'\n")?;

    let result = mcache!(ws.path(), "size", "--json").assert_success()?;
    let report = result.json()?;

    assert_eq!(report["required_size"], 3);

    Ok(())
}

#[test]
fn test_size_honors_max_capacity() -> Result<()> {
    let ws = TestWorkspace::new()?;
    ws.add_build("alpha", &["a", "b", "c", "d"])?;
    ws.write("mcache.toml", "[cache]\nmax_capacity = 3\n")?;

    let config = ws.path().join("mcache.toml").display().to_string();
    let result = mcache!(ws.path(), "--config", config.as_str(), "size", "--json").assert_success()?;
    let report = result.json()?;

    assert_eq!(report["required_size"], 6);
    assert_eq!(report["capacity"], 3);

    Ok(())
}

#[test]
fn test_size_missing_directory_fails() -> Result<()> {
    let ws = TestWorkspace::new()?;

    let result = mcache!(ws.path(), "size", "does-not-exist").assert_failure()?;
    assert!(result.contains_stderr("does-not-exist"));

    Ok(())
}

#[test]
fn test_size_counts_flat_siblings_once() -> Result<()> {
    let ws = TestWorkspace::new()?;
    ws.write(
        "main/settings.gradle",
        "/* shared code lives next to the build */\nincludeFlat 'shared'; rootProject.name = 'main'\n",
    )?;
    ws.write("shared/build.gradle", "")?;

    let result = mcache!(ws.path(), "size", "--json").assert_success()?;
    let report = result.json()?;

    // root + shared + buildSrc slot, reported by both module directories
    assert_eq!(report["required_size"], 3);
    assert_eq!(report["open_projects"], 2);

    Ok(())
}
