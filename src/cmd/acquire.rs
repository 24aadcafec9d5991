//! `acquire` subcommand: take the lease, optionally busy-looping.

use std::path::PathBuf;

use console::style;

use crate::{
   error::Result,
   lease::{self, AcquireOutcome},
   session::Session,
};

/// Parsed `acquire` arguments (the `-r` flag is accepted and ignored; see
/// the design notes on the unused request-file option).
pub struct AcquireArgs {
   pub path: PathBuf,
   pub identity: String,
   pub lease_ms: u64,
   pub op_max_ms: u64,
   pub offset: u64,
   pub busy: bool,
}

/// Runs `acquire`, printing the acquired timestamp on success. Returns the
/// process exit code (0 won, 1 lost).
pub fn execute(args: AcquireArgs) -> Result<i32> {
   let mut session =
      Session::open(&args.path, args.offset, &args.identity, args.lease_ms, args.op_max_ms);

   match lease::acquire(&mut session, args.busy)? {
      AcquireOutcome::Won(ts) => {
         println!("{ts}");
         Ok(0)
      }
      AcquireOutcome::Lost => {
         eprintln!("{}", style("lease held by another identity").red());
         Ok(1)
      }
   }
}
