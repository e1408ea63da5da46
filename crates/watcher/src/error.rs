//! Error types for the coalescing runtime

use thiserror::Error;

/// Errors raised while wiring or running the coalescing runtime
#[derive(Error, Debug)]
pub enum WatcherError {
    /// The worker lane thread could not be started
    #[error("failed to spawn worker lane '{name}': {source}")]
    SpawnLane {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Error from the sizing core
    #[error(transparent)]
    Core(#[from] modelcache_core::Error),
}

/// Result type for the coalescing runtime
pub type Result<T> = std::result::Result<T, WatcherError>;
