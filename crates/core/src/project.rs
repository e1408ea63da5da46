//! Project handles, build models and the state derived from them
//!
//! The host owns projects; this module only describes how the sizing core
//! looks at them. A generic [`Project`] may or may not carry the Gradle
//! capability, and a Gradle project may or may not have computed its model yet.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Identity of a multi-module build: the directory holding its settings file
///
/// Every module of one build reports the same key.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsKey(PathBuf);

impl SettingsKey {
    /// Create a key from a settings directory
    pub fn new(settings_dir: impl Into<PathBuf>) -> Self {
        Self(settings_dir.into())
    }

    /// The settings directory this key was built from
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for SettingsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<&str> for SettingsKey {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<PathBuf> for SettingsKey {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

/// The part of a computed build model the sizing core needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildModel {
    /// Settings directory of the enclosing build
    pub settings_key: SettingsKey,
    /// Number of projects in this build (root included)
    pub subproject_count: u32,
}

impl BuildModel {
    pub fn new(settings_key: impl Into<SettingsKey>, subproject_count: u32) -> Self {
        Self {
            settings_key: settings_key.into(),
            subproject_count,
        }
    }
}

/// State of one buildable unit as seen at snapshot time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectState {
    /// Settings directory of the enclosing build
    pub settings_key: SettingsKey,
    /// Number of modules sharing `settings_key`
    pub subproject_count: u32,
    /// Only projects whose model was computed at least once contribute
    pub has_computed_model: bool,
}

impl ProjectState {
    /// State of a project whose model has been computed
    pub fn computed(model: BuildModel) -> Self {
        Self {
            settings_key: model.settings_key,
            subproject_count: model.subproject_count,
            has_computed_model: true,
        }
    }

    /// State of a project known to the host but still waiting for its model
    pub fn pending(settings_key: impl Into<SettingsKey>) -> Self {
        Self {
            settings_key: settings_key.into(),
            subproject_count: 0,
            has_computed_model: false,
        }
    }
}

/// Gradle capability of a project
pub trait GradleProject: Send + Sync {
    /// Whether a model was ever assigned to this project
    fn was_model_ever_set(&self) -> bool;

    /// The current build model
    ///
    /// Only meaningful when [`GradleProject::was_model_ever_set`] is true.
    fn current_model(&self) -> Result<BuildModel>;
}

/// Generic project handle owned by the host
pub trait Project: Send + Sync {
    /// Human readable name, used in logs
    fn display_name(&self) -> String;

    /// Look up the Gradle capability of this project
    ///
    /// `None` means the project is not a Gradle project, which the sizing
    /// core treats the same as a project without a computed model.
    fn gradle_project(&self) -> Option<&dyn GradleProject>;
}

/// Enumerates the projects currently open in the host
pub trait ProjectSource: Send + Sync {
    fn open_projects(&self) -> Vec<Arc<dyn Project>>;
}

impl<F> ProjectSource for F
where
    F: Fn() -> Vec<Arc<dyn Project>> + Send + Sync,
{
    fn open_projects(&self) -> Vec<Arc<dyn Project>> {
        self()
    }
}
