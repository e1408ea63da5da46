//! `mcache watch` for a bounded duration

use crate::common::TestWorkspace;
use crate::mcache;
use anyhow::Result;

#[test]
fn test_watch_sizes_existing_builds() -> Result<()> {
    let ws = TestWorkspace::new()?;
    ws.add_build("alpha", &["app", "lib"])?;

    let result = mcache!(ws.path(), "watch", "--duration", "1").assert_success()?;

    assert!(result.contains_stdout("Watching"));
    assert!(result.contains_stdout("required 4"));
    assert!(result.contains_stdout("Final cache capacity"));
    assert!(result.contains_stdout("0 failed"));

    Ok(())
}

#[test]
fn test_watch_empty_workspace() -> Result<()> {
    let ws = TestWorkspace::new()?;

    let result = mcache!(ws.path(), "watch", "--duration", "1").assert_success()?;
    assert!(result.contains_stdout("required 0"));

    Ok(())
}
