//! `safelease` — a disk-based mutual-exclusion lease protocol for hosts
//! sharing a block device, plus the CLI that drives it.
//!
//! The crate is organized leaves-first: [`tag`] encodes the on-disk
//! record, [`sector`] performs timed, aligned I/O against it, [`session`]
//! validates and packages one invocation's parameters, [`signal`] provides
//! the real-signal self-fence, [`lease`] implements the state machine over
//! all of the above, and [`cmd`] translates state-machine outcomes into CLI
//! behavior.

pub mod cmd;
pub mod config;
pub mod error;
pub mod lease;
pub mod sector;
pub mod session;
pub mod signal;
pub mod tag;

pub use error::{Error, Result};
