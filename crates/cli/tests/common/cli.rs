//! CLI command execution helpers with automatic timing
//!
//! Wraps the `mcache` binary so tests can run it against a fixture
//! workspace with an isolated configuration directory.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

/// CLI command builder with timing
pub struct McacheCommand {
    working_dir: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl McacheCommand {
    /// Create a new command in the given working directory
    ///
    /// The user's configuration directory is replaced with one inside the
    /// working directory, so a real config file never leaks into a test.
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        let working_dir = working_dir.as_ref().to_path_buf();
        let config_home = working_dir.join(".test-config").display().to_string();
        let mut env = HashMap::new();
        env.insert("XDG_CONFIG_HOME".to_string(), config_home.clone());
        env.insert("HOME".to_string(), config_home);
        env.insert("RUST_LOG".to_string(), "warn".to_string());

        Self {
            working_dir,
            args: Vec::new(),
            env,
        }
    }

    /// Add command arguments
    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Execute command and return result with timing
    pub fn execute(&self) -> Result<CommandResult> {
        let start = Instant::now();

        let output = Command::new(env!("CARGO_BIN_EXE_mcache"))
            .args(&self.args)
            .current_dir(&self.working_dir)
            .envs(&self.env)
            .output()
            .context("Failed to execute mcache")?;

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration: start.elapsed(),
        })
    }

    /// Execute and assert success
    pub fn assert_success(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if !result.success() {
            anyhow::bail!(
                "Command failed (exit code: {}):\nArgs: {:?}\nStdout: {}\nStderr: {}",
                result.exit_code,
                self.args,
                result.stdout,
                result.stderr
            );
        }

        Ok(result)
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStdout: {}",
                self.args,
                result.stdout
            );
        }

        Ok(result)
    }
}

/// Command execution result with timing
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandResult {
    /// Check if command succeeded
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Check if stdout contains text, ignoring color codes
    pub fn contains_stdout(&self, text: &str) -> bool {
        strip_ansi(&self.stdout).contains(text)
    }

    /// Check if stderr contains text, ignoring color codes
    pub fn contains_stderr(&self, text: &str) -> bool {
        strip_ansi(&self.stderr).contains(text)
    }

    /// Parse stdout as JSON
    pub fn json(&self) -> Result<serde_json::Value> {
        serde_json::from_str(&self.stdout).context("stdout is not valid JSON")
    }
}

/// Remove SGR escape sequences (`ESC [ ... m`)
fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' {
            for c in chars.by_ref() {
                if c == 'm' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Macro for convenient command construction
///
/// Usage:
/// ```ignore
/// mcache!(dir, "size", "--json").assert_success()?;
/// ```
#[macro_export]
macro_rules! mcache {
    ($dir:expr, $($arg:expr),*) => {{
        let mut cmd = $crate::common::cli::McacheCommand::new($dir);
        cmd.args(&[$($arg),*]);
        cmd
    }};
}
