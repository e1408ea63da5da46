//! Fixture workspaces made of Gradle builds

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory populated with Gradle builds
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: TempDir::new()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Canonical workspace root, as reported by the CLI
    pub fn root(&self) -> PathBuf {
        self.dir.path().canonicalize().unwrap_or_else(|_| self.dir.path().to_path_buf())
    }

    /// Add a Groovy build with the given modules, creating their directories
    pub fn add_build(&self, name: &str, modules: &[&str]) -> Result<PathBuf> {
        let root = self.path().join(name);
        fs::create_dir_all(&root)?;

        let includes: Vec<String> = modules.iter().map(|m| format!("'{}'", m)).collect();
        let settings = if includes.is_empty() {
            format!("rootProject.name = '{}'\n", name)
        } else {
            format!("rootProject.name = '{}'\ninclude {}\n", name, includes.join(", "))
        };
        fs::write(root.join("settings.gradle"), settings)?;

        for module in modules {
            let dir = module
                .split(':')
                .filter(|s| !s.is_empty())
                .fold(root.clone(), |dir, segment| dir.join(segment));
            fs::create_dir_all(&dir)?;
            fs::write(dir.join("build.gradle"), "")?;
        }

        Ok(root)
    }

    /// Write a file relative to the workspace root
    pub fn write(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }
}
