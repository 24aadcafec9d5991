//! Timed, aligned, direct-mode I/O against a single 512-byte lease sector.
//!
//! Reads and writes go through [`SectorFile`], which owns the open file
//! handle and a page-aligned scratch buffer so every operation is a single
//! positional syscall against the exact bytes the protocol cares about.
//! Deadline enforcement happens here, not in the state machine: a caller
//! passes whether the *current* read or write is deadline-sensitive, and
//! this module is the only place that measures wall time around a syscall.

use std::{
   alloc::{self, Layout},
   fs::{File, OpenOptions},
   os::unix::fs::FileExt,
   path::Path,
   ptr::NonNull,
   time::{Duration, Instant},
};

use crate::{
   error::{Error, Result},
   tag::{Tag, TAGLEN},
};

/// Sector size in bytes. Only the first [`TAGLEN`](crate::tag::TAGLEN) bytes
/// carry meaning; the rest are written as zero.
pub const SECTOR_SIZE: usize = 512;

/// Alignment direct I/O requires for both the file offset and the buffer.
const IO_ALIGN: usize = 4096;

/// A `SECTOR_SIZE`-byte buffer aligned to [`IO_ALIGN`], as `O_DIRECT` demands.
struct AlignedBuffer {
   ptr: NonNull<u8>,
   layout: Layout,
}

impl AlignedBuffer {
   fn new() -> Self {
      let layout = Layout::from_size_align(SECTOR_SIZE, IO_ALIGN).expect("valid fixed layout");
      // SAFETY: `layout` has non-zero size, so `alloc_zeroed` either returns a
      // valid, zeroed allocation of exactly that size/align or null, which we
      // check immediately below.
      let raw = unsafe { alloc::alloc_zeroed(layout) };
      let ptr = NonNull::new(raw).unwrap_or_else(|| alloc::handle_alloc_error(layout));
      Self { ptr, layout }
   }

   fn as_slice(&self) -> &[u8] {
      // SAFETY: `ptr` was allocated above with exactly `layout.size()` bytes
      // and is never aliased outside of `&self`/`&mut self` borrows.
      unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
   }

   fn as_mut_slice(&mut self) -> &mut [u8] {
      // SAFETY: see `as_slice`; `&mut self` guarantees exclusivity.
      unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.layout.size()) }
   }
}

impl Drop for AlignedBuffer {
   fn drop(&mut self) {
      // SAFETY: `ptr`/`layout` are exactly what we passed to `alloc_zeroed`.
      unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
   }
}

/// An open lease sector, ready for timed positional reads and writes.
pub struct SectorFile {
   file: File,
   buf: AlignedBuffer,
}

impl SectorFile {
   /// Opens `path` read-write with direct I/O where the platform supports
   /// it. On platforms without `O_DIRECT` the file is opened buffered and
   /// every write is followed by an explicit `fsync`, which the caller
   /// should account for when sizing `op_max_ms`.
   pub fn open(path: &Path) -> Result<Self> {
      let mut options = OpenOptions::new();
      options.read(true).write(true);
      #[cfg(target_os = "linux")]
      {
         use std::os::unix::fs::OpenOptionsExt;
         options.custom_flags(libc::O_DIRECT);
      }
      let file = options.open(path)?;
      Ok(Self { file, buf: AlignedBuffer::new() })
   }

   /// Wraps an already-open file without requesting `O_DIRECT`, for tests
   /// that run against tmpfs-backed paths that reject it.
   #[cfg(test)]
   pub(crate) fn from_parts_for_test(file: File) -> Self {
      Self { file, buf: AlignedBuffer::new() }
   }

   /// Reads the tag at `offset`. If `deadline` is `Some(limit)` and the
   /// syscall takes longer than `limit`, returns
   /// [`Error::DeadlineExceeded`] even though the read itself succeeded —
   /// the caller cannot trust data observed outside its timing budget.
   ///
   /// A short read (`0 < n < SECTOR_SIZE`) is treated as success and only
   /// the leading [`TAGLEN`] bytes are consulted; a full positional read of
   /// one sector is atomic in practice on the platforms this targets.
   pub fn read_tag(&mut self, offset: u64, deadline: Option<Duration>) -> Result<Tag> {
      let start = Instant::now();
      let n = self.file.read_at(self.buf.as_mut_slice(), offset)?;
      let elapsed = start.elapsed();

      if n == 0 {
         return Err(Error::ShortIo { op: "read", offset, expected: SECTOR_SIZE, actual: n });
      }
      if let Some(limit) = deadline {
         check_deadline(elapsed, limit)?;
      }
      Ok(Tag::from_bytes(&self.buf.as_slice()[..TAGLEN.min(n)]))
   }

   /// Writes `tag` at `offset`, zero-filling the remainder of the sector.
   /// Deadline semantics mirror [`read_tag`](Self::read_tag).
   pub fn write_tag(&mut self, offset: u64, tag: &Tag, deadline: Option<Duration>) -> Result<()> {
      {
         let buf = self.buf.as_mut_slice();
         buf[..TAGLEN].copy_from_slice(tag.as_bytes());
         buf[TAGLEN..].fill(0);
      }

      let start = Instant::now();
      let n = self.file.write_at(self.buf.as_slice(), offset)?;
      #[cfg(not(target_os = "linux"))]
      self.file.sync_data()?;
      let elapsed = start.elapsed();

      if n < TAGLEN {
         return Err(Error::ShortIo { op: "write", offset, expected: SECTOR_SIZE, actual: n });
      }
      if let Some(limit) = deadline {
         check_deadline(elapsed, limit)?;
      }
      Ok(())
   }

   /// Reads the host wall clock (microseconds since the epoch), builds a
   /// tag for `identity`, and writes it with deadline enforcement.
   /// Returns the tag written and the timestamp it carries.
   pub fn write_timestamp(
      &mut self,
      offset: u64,
      identity: &str,
      op_max_ms: u64,
   ) -> Result<(Tag, u64)> {
      let ts = now_micros();
      let tag = Tag::build(identity, ts);
      self.write_tag(offset, &tag, Some(Duration::from_millis(op_max_ms)))?;
      Ok((tag, ts))
   }
}

fn check_deadline(elapsed: Duration, limit: Duration) -> Result<()> {
   if elapsed > limit {
      return Err(Error::DeadlineExceeded { limit_ms: limit.as_millis() as u64 });
   }
   Ok(())
}

/// Current wall-clock time as whole microseconds since the Unix epoch.
pub fn now_micros() -> u64 {
   std::time::SystemTime::now()
      .duration_since(std::time::UNIX_EPOCH)
      .unwrap_or_default()
      .as_micros() as u64
}
