//! CLI command implementations for safelease.
//!
//! Each module corresponds to one subcommand and owns translating a
//! state-machine outcome into the single line of stdout and the process
//! exit code the driver reports.

pub mod acquire;
pub mod query;
pub mod release;
pub mod renew;
