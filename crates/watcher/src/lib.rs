//! Coalescing runtime for model cache sizing
//!
//! This crate provides:
//! - Task executors (a dedicated worker lane, and inline execution)
//! - A single-flight update coalescer
//! - The model change listener that keeps the model cache sized

pub mod coalesce;
pub mod error;
pub mod executor;
pub mod updater;

// Re-exports
pub use coalesce::{CoalescerConfig, CoalescerState, CoalescerStats, UpdateCoalescer};
pub use error::{Result, WatcherError};
pub use executor::{InlineExecutor, Task, TaskExecutor, WorkerLane};
pub use updater::{
    CheckOutcome, CoalescedSizeUpdater, CoalescedSizeUpdaterBuilder, ModelChangeListener,
};
