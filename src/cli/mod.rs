//! Command-line interface for tune-harvest.
//!
//! This module provides the `download`, `tag`, `check-tools` and
//! `init-config` commands on top of the library modules.

mod commands;

pub use commands::{Cli, Commands, run_command};
