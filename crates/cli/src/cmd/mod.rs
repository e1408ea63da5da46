//! CLI command implementations

pub mod config;
pub mod size;
pub mod watch;
