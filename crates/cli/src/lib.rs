//! mcache library
//!
//! Reference host for the model cache sizing runtime:
//! - [`config`]: configuration file handling
//! - [`workspace`]: Gradle builds discovered on the filesystem
//! - [`source`]: filesystem watcher raising model change notifications

pub mod config;
pub mod source;
pub mod workspace;
