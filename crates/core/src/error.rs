//! Error types for the sizing core

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the sizing core and its collaborators
#[derive(Error, Debug)]
pub enum Error {
    /// A required collaborator was not supplied when wiring a component
    #[error("missing required collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// The build model of a project could not be read
    #[error("model of project '{project}' is unavailable: {reason}")]
    ModelUnavailable { project: String, reason: String },

    /// A settings file could not be read or parsed
    #[error("failed to read settings file {path}: {source}")]
    Settings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Capacity bounds that can never be satisfied
    #[error("invalid capacity bounds: min {min} exceeds max {max}")]
    InvalidBounds { min: u64, max: u64 },
}

impl Error {
    /// Shorthand for [`Error::ModelUnavailable`]
    pub fn model_unavailable(project: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            project: project.into(),
            reason: reason.into(),
        }
    }
}
