//! `query` subcommand: report the sector's state without mutating it.

use std::path::PathBuf;

use console::style;

use crate::{
   error::{self, Result},
   lease,
   sector::SectorFile,
};

pub struct QueryArgs {
   pub path: PathBuf,
   pub offset: u64,
}

/// Runs `query`, printing one formatted line describing the sector. Always
/// exits 0 — a successful read of either a free or locked sector is
/// success; only an I/O fault propagates as an error.
pub fn execute(args: QueryArgs) -> Result<i32> {
   let mut sector = SectorFile::open(&args.path).unwrap_or_else(|e| {
      error::fatal(format!("cannot open {} read-write: {e}", args.path.display()))
   });
   let record = lease::query(&mut sector, args.offset)?;

   if record.free {
      println!("{}", style("FREE").green());
   } else {
      let width = crate::config::get().op_label_width;
      let formatted = format_timestamp(record.timestamp_us);
      println!(
         "{} ID {:width$} TS {} ({formatted})",
         style("LOCKED").red(),
         record.identity,
         record.timestamp_hex,
      );
   }
   Ok(0)
}

fn format_timestamp(ts_us: u64) -> String {
   let secs = ts_us / 1_000_000;
   let micros = ts_us % 1_000_000;
   let datetime =
      chrono::DateTime::from_timestamp(secs as i64, (micros * 1000) as u32).unwrap_or_default();
   datetime.format("%Y-%m-%d %H:%M:%S%.6f UTC").to_string()
}
