//! Error types for the safelease lease engine and CLI driver.

use std::io;

use thiserror::Error;

/// Main error type for the safelease application.
///
/// This enum distinguishes ordinary I/O faults from the protocol-level
/// outcomes (lost, not-held, timed out) that are not errors in the Rust
/// sense but must still be reported and mapped to a process exit code.
#[derive(Debug, Error)]
pub enum Error {
   /// I/O error occurred while opening, reading, or writing the sector.
   #[error("io error: {0}")]
   Io(#[from] io::Error),

   /// A sector read or write exceeded `op_max_ms`.
   #[error("deadline exceeded: operation took longer than {limit_ms}ms")]
   DeadlineExceeded { limit_ms: u64 },

   /// Caller-supplied parameters failed validation before any I/O was
   /// attempted. Returned by the pure `validate_*` helpers in `session.rs`
   /// for testability; real CLI call sites never let this reach
   /// [`exit_code`](Self::exit_code) — they intercept it and call
   /// [`fatal`] instead, matching the original's `PANIC()`.
   #[error("invalid parameters: {0}")]
   InvalidParameters(String),

   /// A short read or write left the sector only partially touched.
   #[error("short {op} of sector at offset {offset}: expected {expected} bytes, got {actual}")]
   ShortIo { op: &'static str, offset: u64, expected: usize, actual: usize },

   /// Installing a signal handler failed; this is fatal because it would
   /// otherwise silently disable the self-fence.
   #[error("failed to install signal handler: {0}")]
   SignalSetup(#[source] io::Error),
}

impl Error {
   /// Maps an error to the process exit code the CLI driver reports.
   ///
   /// Every variant here is a *reported* failure (exit 1), per §6/§7: the
   /// only other codes are 0 (success), the fatal panic path ([`fatal`],
   /// exit -1), and the self-fence abort, neither of which flows through
   /// this type — they terminate the process directly.
   pub fn exit_code(&self) -> i32 {
      match self {
         Error::InvalidParameters(_)
         | Error::SignalSetup(_)
         | Error::Io(_)
         | Error::DeadlineExceeded { .. }
         | Error::ShortIo { .. } => 1,
      }
   }
}

/// Prints a diagnostic and aborts the process with exit code -1, mirroring
/// the original's `PANIC()`/`panic()` macros. Used for failures that must
/// never reach ordinary `Result` plumbing: invalid parameters, an
/// unopenable sector path — both are fatal before any I/O is attempted.
pub fn fatal(message: impl std::fmt::Display) -> ! {
   eprintln!("safelease: {message}");
   std::process::exit(-1);
}

/// Standard result type using [`enum@Error`] as the default error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;
