//! `renew` subcommand: refresh our hold on the lease.

use std::path::PathBuf;

use crate::{
   error::Result,
   lease::{self, RenewOutcome},
   session::Session,
};

/// Parsed `renew` arguments.
pub struct RenewArgs {
   pub path: PathBuf,
   pub identity: String,
   pub lease_ms: u64,
   pub op_max_ms: u64,
   pub offset: u64,
}

/// Runs `renew`, always printing a timestamp. Returns the process exit code
/// (0 renewed, 1 not-held/timed-out).
pub fn execute(args: RenewArgs) -> Result<i32> {
   let mut session =
      Session::open(&args.path, args.offset, &args.identity, args.lease_ms, args.op_max_ms);

   match lease::renew(&mut session)? {
      RenewOutcome::Renewed(ts) => {
         println!("{ts}");
         Ok(0)
      }
      RenewOutcome::NotHeld => {
         println!("0");
         Ok(1)
      }
      RenewOutcome::TimedOut(ts) => {
         println!("{ts}");
         Ok(1)
      }
   }
}
