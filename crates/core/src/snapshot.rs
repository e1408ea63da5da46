//! Snapshot of the host's open projects
//!
//! A snapshot is taken at the start of every recomputation. Projects without
//! the Gradle capability, without a computed model, or whose model cannot be
//! read are left out; one unreadable project never aborts the snapshot.

use crate::aggregate::{compute_required_size, SizeRequirements};
use crate::project::{Project, ProjectState};
use std::sync::Arc;
use tracing::{debug, warn};

/// Project states read at the start of one recomputation
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// States of the projects that contribute
    pub states: Vec<ProjectState>,
    /// Number of open projects left out of `states`
    pub excluded: usize,
}

impl Snapshot {
    /// Per-build requirements of this snapshot
    pub fn requirements(&self) -> SizeRequirements {
        SizeRequirements::from_states(&self.states)
    }

    /// Total required cache size of this snapshot
    pub fn required_size(&self) -> u64 {
        compute_required_size(&self.states)
    }

    /// Number of open projects the snapshot looked at
    pub fn project_count(&self) -> usize {
        self.states.len() + self.excluded
    }
}

/// Read the state of every open project
pub fn take_snapshot(projects: &[Arc<dyn Project>]) -> Snapshot {
    let mut snapshot = Snapshot::default();

    for project in projects {
        match read_state(project.as_ref()) {
            Some(state) => snapshot.states.push(state),
            None => snapshot.excluded += 1,
        }
    }

    snapshot
}

fn read_state(project: &dyn Project) -> Option<ProjectState> {
    let gradle = match project.gradle_project() {
        Some(gradle) => gradle,
        None => {
            debug!("Skipping non-Gradle project {}", project.display_name());
            return None;
        }
    };

    if !gradle.was_model_ever_set() {
        debug!("Skipping {}: model not computed yet", project.display_name());
        return None;
    }

    match gradle.current_model() {
        Ok(model) => Some(ProjectState::computed(model)),
        Err(e) => {
            warn!("Excluding {} from cache sizing: {}", project.display_name(), e);
            None
        }
    }
}
