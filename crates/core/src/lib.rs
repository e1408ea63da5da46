//! Model cache sizing core
//!
//! This crate provides the pure, synchronous half of the cache sizing system:
//! - Project state and build model types
//! - Capability lookup from generic project handles
//! - Snapshot construction from the host's open projects
//! - The aggregation rule turning a snapshot into a required cache size
//! - Capacity policies applied to the model cache

pub mod aggregate;
pub mod capacity;
pub mod error;
pub mod project;
pub mod snapshot;

// Re-export main types for convenience
pub use aggregate::{compute_required_size, SizeRequirements, BUILD_SCOPED_SLOTS};
pub use capacity::{CacheCapacity, CacheSizeSink, CapacityBounds, CapacityPolicy};
pub use error::Error;
pub use project::{BuildModel, GradleProject, Project, ProjectSource, ProjectState, SettingsKey};
pub use snapshot::{take_snapshot, Snapshot};

/// Common result type used throughout modelcache-core
pub type Result<T> = std::result::Result<T, Error>;
