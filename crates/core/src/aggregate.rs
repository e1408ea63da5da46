//! Aggregation of project states into a required cache size
//!
//! Every build with a computed model needs one cache slot per project plus
//! one slot for a build-scoped unit (`buildSrc`). Modules of the same build
//! share a settings key and collapse into a single entry, so a build opened
//! module by module is never counted twice.

use crate::project::{ProjectState, SettingsKey};
use serde::Serialize;
use std::collections::BTreeMap;

/// Slots reserved per build on top of its projects (for a possible `buildSrc`)
pub const BUILD_SCOPED_SLOTS: u32 = 1;

/// Required slots per build, keyed by settings key
///
/// Built from scratch for every snapshot and never updated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SizeRequirements {
    slots: BTreeMap<SettingsKey, u32>,
}

impl SizeRequirements {
    /// Build the requirement map from a snapshot of project states
    ///
    /// States without a computed model are skipped. When several states share
    /// a key the last one wins; modules of one build are expected to report
    /// the same subproject count.
    pub fn from_states<'a, I>(states: I) -> Self
    where
        I: IntoIterator<Item = &'a ProjectState>,
    {
        let mut slots = BTreeMap::new();
        for state in states {
            if !state.has_computed_model {
                continue;
            }
            let required = state.subproject_count.saturating_add(BUILD_SCOPED_SLOTS);
            slots.insert(state.settings_key.clone(), required);
        }
        Self { slots }
    }

    /// Slots required by one build, if it contributes
    pub fn get(&self, key: &SettingsKey) -> Option<u32> {
        self.slots.get(key).copied()
    }

    /// Iterate builds in settings key order
    pub fn iter(&self) -> impl Iterator<Item = (&SettingsKey, u32)> {
        self.slots.iter().map(|(key, slots)| (key, *slots))
    }

    /// Number of contributing builds
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Sum of all per-build requirements
    pub fn total(&self) -> u64 {
        self.slots
            .values()
            .fold(0u64, |acc, &slots| acc.saturating_add(u64::from(slots)))
    }
}

/// Compute the total cache size required by a snapshot
///
/// An empty snapshot, or one where no project has a computed model, yields 0.
pub fn compute_required_size(snapshot: &[ProjectState]) -> u64 {
    SizeRequirements::from_states(snapshot).total()
}
