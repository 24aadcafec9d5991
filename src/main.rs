use std::path::PathBuf;

use clap::{Parser, Subcommand};
use safelease::{
   Error, Result,
   cmd::{
      self,
      acquire::AcquireArgs,
      query::QueryArgs,
      release::ReleaseArgs,
      renew::RenewArgs,
   },
};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Disk-based mutual-exclusion lease protocol.
#[derive(Parser)]
#[command(name = "safelease")]
#[command(about = "Acquire, renew, release, and query disk-based leases")]
#[command(version)]
struct Cli {
   /// Increase debug verbosity; repeatable (-d info, -dd debug, -ddd trace).
   #[arg(short = 'd', action = clap::ArgAction::Count, global = true)]
   debug: u8,

   #[command(subcommand)]
   command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
   /// Acquire the lease, optionally busy-looping until it is won.
   Acquire {
      /// External request file for identity validation; accepted for
      /// compatibility, never consulted.
      #[arg(short = 'r')]
      request: Option<PathBuf>,

      /// Busy-loop until acquired rather than giving up after one round.
      #[arg(short = 'b')]
      busy: bool,

      /// Sector byte offset.
      #[arg(short = 'o')]
      offset: Option<u64>,

      path: PathBuf,
      id: String,
      lease_ms: u64,
      op_max_ms: u64,
   },

   /// Renew the caller's hold on the lease.
   Renew {
      #[arg(short = 'r')]
      request: Option<PathBuf>,

      #[arg(short = 'o')]
      offset: Option<u64>,

      /// Last-known timestamp; accepted for compatibility, never consulted
      /// — a timed-out renewal reports the sector's own on-disk timestamp.
      #[arg(short = 't')]
      last_ts: Option<u64>,

      path: PathBuf,
      id: String,
      lease_ms: u64,
      op_max_ms: u64,
   },

   /// Release the lease.
   Release {
      /// Release even if the sector's identity does not match ours.
      #[arg(short = 'f')]
      force: bool,

      #[arg(short = 'o')]
      offset: Option<u64>,

      path: PathBuf,
      id: String,
   },

   /// Print the sector's current state.
   Query {
      #[arg(short = 'o')]
      offset: Option<u64>,

      path: PathBuf,
   },

   /// Documented no-op: the original's subprocess-spawning helper is out
   /// of scope here (see the crate's design notes).
   Protect,
}

fn main() {
   let cli = Cli::parse();

   let base_level = safelease::config::get().debug + cli.debug;
   let level = match base_level {
      0 => Level::WARN,
      1 => Level::INFO,
      2 => Level::DEBUG,
      _ => Level::TRACE,
   };
   tracing_subscriber::fmt()
      .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
      .init();

   if let Err(err) = safelease::signal::install_termination_handler() {
      eprintln!("{err}");
      std::process::exit(1);
   }

   match run(cli) {
      Ok(code) => std::process::exit(code),
      Err(err) => {
         eprintln!("{err}");
         std::process::exit(err.exit_code());
      }
   }
}

fn run(cli: Cli) -> Result<i32> {
   let default_offset = safelease::config::get().default_offset;

   match cli.command {
      Cmd::Acquire { request: _, busy, offset, path, id, lease_ms, op_max_ms } => {
         cmd::acquire::execute(AcquireArgs {
            path,
            identity: id,
            lease_ms,
            op_max_ms,
            offset: offset.unwrap_or(default_offset),
            busy,
         })
      }
      Cmd::Renew { request: _, offset, last_ts: _, path, id, lease_ms, op_max_ms } => {
         cmd::renew::execute(RenewArgs {
            path,
            identity: id,
            lease_ms,
            op_max_ms,
            offset: offset.unwrap_or(default_offset),
         })
      }
      Cmd::Release { force, offset, path, id } => cmd::release::execute(ReleaseArgs {
         path,
         identity: id,
         offset: offset.unwrap_or(default_offset),
         force,
      }),
      Cmd::Query { offset, path } => {
         cmd::query::execute(QueryArgs { path, offset: offset.unwrap_or(default_offset) })
      }
      Cmd::Protect => {
         tracing::debug!("protect: no-op stub");
         Ok(0)
      }
   }
}
