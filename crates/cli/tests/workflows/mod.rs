//! Workflow integration tests
//!
//! Each module drives the `mcache` binary end to end against fixture
//! workspaces.

pub mod config_command;
pub mod size_report;
pub mod watch_session;
