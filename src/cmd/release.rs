//! `release` subcommand: clear the lease.

use std::path::PathBuf;

use console::style;

use crate::{
   error::{self, Result},
   lease::{self, ReleaseOutcome},
   sector::SectorFile,
   session,
};

pub struct ReleaseArgs {
   pub path: PathBuf,
   pub identity: String,
   pub offset: u64,
   pub force: bool,
}

/// Runs `release`. Returns the process exit code (0 released, 1 not-held).
pub fn execute(args: ReleaseArgs) -> Result<i32> {
   if let Err(e) = session::validate_identity(&args.identity) {
      error::fatal(e);
   }
   let mut sector = SectorFile::open(&args.path).unwrap_or_else(|e| {
      error::fatal(format!("cannot open {} read-write: {e}", args.path.display()))
   });

   match lease::release(&mut sector, args.offset, &args.identity, args.force)? {
      ReleaseOutcome::Released => Ok(0),
      ReleaseOutcome::NotHeld => {
         eprintln!("{}", style("not held by this identity").yellow());
         Ok(1)
      }
   }
}
