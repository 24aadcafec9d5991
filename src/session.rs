//! Explicit per-invocation session state.
//!
//! The original C tool keeps `id`, `path`, `lease_ms`, `op_max_ms` and the
//! I/O buffer as process-wide globals, read by every procedure. Here they
//! are a plain struct constructed once per CLI invocation and threaded
//! through the state machine, validated up front so no I/O is attempted
//! against parameters that were never going to be legal.

use std::path::{Path, PathBuf};

use crate::{
   error::{Error, Result},
   sector::SectorFile,
   tag::{IDLEN, SENTINEL_STR},
};

/// Everything one `acquire`/`renew`/`release`/`query` invocation needs.
pub struct Session {
   pub sector: SectorFile,
   pub path: PathBuf,
   pub offset: u64,
   pub identity: String,
   pub lease_ms: u64,
   pub op_max_ms: u64,
}

impl Session {
   /// Validates every parameter and opens the sector file. Invalid
   /// parameters or an unopenable path abort the process immediately
   /// (mirroring the original's `PANIC()`) rather than returning an
   /// ordinary error: no I/O against the sector happens until either this
   /// call succeeds or the process is already gone.
   pub fn open(path: &Path, offset: u64, identity: &str, lease_ms: u64, op_max_ms: u64) -> Self {
      if let Err(e) = validate_identity(identity) {
         crate::error::fatal(e);
      }
      if let Err(e) = validate_lease_params(lease_ms, op_max_ms) {
         crate::error::fatal(e);
      }
      let sector = SectorFile::open(path).unwrap_or_else(|e| {
         crate::error::fatal(format!("cannot open {} read-write: {e}", path.display()))
      });
      Self {
         sector,
         path: path.to_path_buf(),
         offset,
         identity: identity.to_string(),
         lease_ms,
         op_max_ms,
      }
   }
}

/// `id` must fit the 16-byte identity field and must not collide with the
/// sentinel's reserved identity text.
pub fn validate_identity(identity: &str) -> Result<()> {
   if identity.is_empty() {
      return Err(Error::InvalidParameters("identity must not be empty".into()));
   }
   if identity.len() > IDLEN {
      return Err(Error::InvalidParameters(format!(
         "identity {identity:?} exceeds {IDLEN} bytes"
      )));
   }
   if SENTINEL_STR.starts_with(identity) {
      return Err(Error::InvalidParameters(format!(
         "identity {identity:?} collides with the sentinel's reserved prefix"
      )));
   }
   Ok(())
}

/// `op_max_ms` must be at least 1000, a multiple of 1000, and no larger
/// than `lease_ms`.
pub fn validate_lease_params(lease_ms: u64, op_max_ms: u64) -> Result<()> {
   if op_max_ms < 1000 {
      return Err(Error::InvalidParameters(format!(
         "op_max_ms {op_max_ms} must be at least 1000"
      )));
   }
   if op_max_ms % 1000 != 0 {
      return Err(Error::InvalidParameters(format!(
         "op_max_ms {op_max_ms} must be a multiple of 1000"
      )));
   }
   if lease_ms < op_max_ms {
      return Err(Error::InvalidParameters(format!(
         "lease_ms {lease_ms} must be >= op_max_ms {op_max_ms}"
      )));
   }
   Ok(())
}

/// `path` must already exist and be readable/writable; `Session::open`
/// surfaces the underlying I/O error, but callers that want to fail before
/// touching the sector (e.g. the CLI's argument parsing) can use this.
pub fn validate_path(path: &Path) -> Result<()> {
   let meta = std::fs::metadata(path)
      .map_err(|e| Error::InvalidParameters(format!("{}: {e}", path.display())))?;
   if meta.permissions().readonly() {
      return Err(Error::InvalidParameters(format!(
         "{} is not writable",
         path.display()
      )));
   }
   Ok(())
}
