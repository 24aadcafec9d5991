//! End-to-end scenarios exercising the built `safelease` binary, spawned as
//! a subprocess the way a real deployment would invoke it.

use std::{
   path::Path,
   process::{Command, Output},
};

use tempfile::NamedTempFile;

const SECTOR_SIZE: usize = 512;

fn fresh_sector() -> NamedTempFile {
   let file = NamedTempFile::new().expect("tempfile");
   std::fs::write(file.path(), vec![0u8; SECTOR_SIZE]).expect("seed sector");
   file
}

fn run(args: &[&str]) -> Output {
   Command::new(env!("CARGO_BIN_EXE_safelease"))
      .args(args)
      .output()
      .expect("spawn safelease")
}

fn stdout(output: &Output) -> String {
   String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn path_str(path: &Path) -> &str {
   path.to_str().expect("utf8 path")
}

/// Scenario 1: a fresh sector is acquired, prints a timestamp, exits 0;
/// `query` afterward reports `LOCKED`.
#[test]
fn scenario_acquire_then_query_reports_locked() {
   let sector = fresh_sector();
   let path = path_str(sector.path());

   let acquire = run(&["acquire", path, "A", "60000", "5000"]);
   assert_eq!(acquire.status.code(), Some(0));
   let ts: u64 = stdout(&acquire).parse().expect("acquire prints a timestamp");
   assert!(ts > 0);

   let query = run(&["query", path]);
   assert_eq!(query.status.code(), Some(0));
   let text = stdout(&query);
   assert!(text.contains("LOCKED"));
   assert!(text.contains("ID A"));
}

/// Scenario 2: a second identity's one-shot acquire attempt is lost.
#[test]
fn scenario_second_acquire_is_lost() {
   let sector = fresh_sector();
   let path = path_str(sector.path());

   assert_eq!(run(&["acquire", path, "A", "60000", "5000"]).status.code(), Some(0));
   let second = run(&["acquire", path, "B", "60000", "5000"]);
   assert_eq!(second.status.code(), Some(1));
}

/// Scenario 3: releasing the holder frees the sector.
#[test]
fn scenario_release_frees_sector() {
   let sector = fresh_sector();
   let path = path_str(sector.path());

   assert_eq!(run(&["acquire", path, "A", "60000", "5000"]).status.code(), Some(0));
   assert_eq!(run(&["release", path, "A"]).status.code(), Some(0));

   let query = run(&["query", path]);
   assert!(stdout(&query).contains("FREE"));
}

/// Scenario 5: `renew` against a sector held by a different identity
/// reports not-held and prints `0`.
#[test]
fn scenario_renew_by_non_holder_is_not_held() {
   let sector = fresh_sector();
   let path = path_str(sector.path());

   assert_eq!(run(&["acquire", path, "B", "60000", "5000"]).status.code(), Some(0));
   let renew = run(&["renew", path, "A", "60000", "5000"]);
   assert_eq!(renew.status.code(), Some(1));
   assert_eq!(stdout(&renew), "0");
}

/// Parameter validation panics (process::exit(-1), which Unix truncates to
/// 255) before any I/O is attempted, regardless of the sector's contents.
#[test]
fn rejects_invalid_op_max_ms_before_touching_sector() {
   let sector = fresh_sector();
   let path = path_str(sector.path());
   let before = std::fs::read(sector.path()).expect("read sector");

   for op_max_ms in ["0", "500", "1500"] {
      let out = run(&["acquire", path, "A", "60000", op_max_ms]);
      assert_eq!(out.status.code(), Some(255));
   }
   let lease_too_small = run(&["acquire", path, "A", "1000", "5000"]);
   assert_eq!(lease_too_small.status.code(), Some(255));

   let after = std::fs::read(sector.path()).expect("read sector");
   assert_eq!(before, after, "rejected parameters must not touch the sector");
}

/// Scenario 4: a busy acquirer eventually wins once the current holder's
/// lease has expired and it stops refreshing.
///
/// Slow by design: at the protocol's minimum legal `op_max_ms` (1000ms),
/// the wait-for-holder-to-die backoff alone is `(lease_ms + 6*op_max_ms) *
/// 1000us` = 7s, plus a 2s contend window, so this test takes roughly 9s
/// of wall time. That cost comes from the protocol's own timing floor, not
/// from the test.
#[test]
fn scenario_busy_acquire_wins_after_holder_expires() {
   let sector = fresh_sector();
   let path = path_str(sector.path());

   assert_eq!(run(&["acquire", path, "A", "1000", "1000"]).status.code(), Some(0));
   std::thread::sleep(std::time::Duration::from_millis(1100));

   let busy = run(&["acquire", "-b", path, "B", "1000", "1000"]);
   assert_eq!(busy.status.code(), Some(0));

   let query = run(&["query", path]);
   assert!(stdout(&query).contains("ID B"));
}

/// Scenario 6: a `renew` issued after the lease already timed out reports
/// failure and prints the sector's own on-disk timestamp, not a stale `-t`
/// value or `0`.
#[test]
fn scenario_renew_after_timeout_prints_stored_timestamp() {
   let sector = fresh_sector();
   let path = path_str(sector.path());

   let acquire = run(&["acquire", path, "A", "1000", "1000"]);
   assert_eq!(acquire.status.code(), Some(0));
   let acquired_ts = stdout(&acquire);

   std::thread::sleep(std::time::Duration::from_millis(1100));

   let renew = run(&["renew", path, "A", "1000", "1000"]);
   assert_eq!(renew.status.code(), Some(1));
   assert_eq!(stdout(&renew), acquired_ts);
}

/// Force-release clears the sector regardless of which identity holds it.
#[test]
fn force_release_clears_sector_regardless_of_identity() {
   let sector = fresh_sector();
   let path = path_str(sector.path());

   assert_eq!(run(&["acquire", path, "A", "60000", "5000"]).status.code(), Some(0));
   let forced = run(&["release", "-f", path, "B"]);
   assert_eq!(forced.status.code(), Some(0));

   let query = run(&["query", path]);
   assert!(stdout(&query).contains("FREE"));
}
