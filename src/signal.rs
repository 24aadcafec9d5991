//! Real OS signal handling: the renew self-fence and orderly termination.
//!
//! [`AlarmGuard`] arms `SIGALRM` on construction and disarms it on `Drop`,
//! the same acquire-on-construct/release-on-`Drop` shape used elsewhere in
//! this crate's predecessor for file locks — except here what's guarded is
//! a signal, not a lock. If the alarm fires before the guard is dropped,
//! the handler aborts the process immediately; it never returns control to
//! Rust code, so there is no "cancelled" state to reconcile.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};

static ALARM_ARMED: AtomicBool = AtomicBool::new(false);

const FENCE_MESSAGE: &[u8] = b"safelease: IO op too long, self-fencing\n";

/// Async-signal-safe: writes a fixed message directly to stderr and exits
/// without unwinding, running destructors, or touching the allocator.
extern "C" fn alarm_fired(_signum: libc::c_int) {
   if !ALARM_ARMED.load(Ordering::SeqCst) {
      // The guard disarmed and the signal was already in flight; drop it.
      return;
   }
   // SAFETY: `write` and `_exit` are both on the POSIX async-signal-safe
   // list. The fd and buffer are both valid for the duration of the call.
   unsafe {
      libc::write(
         libc::STDERR_FILENO,
         FENCE_MESSAGE.as_ptr().cast(),
         FENCE_MESSAGE.len(),
      );
      libc::_exit(134); // matches the 128+SIGALRM convention described in §6
   }
}

/// Arms `SIGALRM` for `secs` seconds on construction; disarms on `Drop`
/// (including on early return via `?`). Dropping before the alarm fires is
/// the only way to observe the guard's effect end — there is no explicit
/// "cancel" other than letting it go out of scope.
pub struct AlarmGuard {
   previous: libc::sigaction,
}

impl AlarmGuard {
   /// Installs the handler and arms an alarm `secs` seconds out.
   ///
   /// `secs == 0` does not fire immediately: POSIX `alarm(0)` cancels any
   /// pending alarm rather than arming one. This mirrors `floor(msleft /
   /// 1000)` rounding to zero in the original protocol for a sub-second
   /// remaining lease window; callers that already know `msleft <= 0`
   /// should reject the renewal as timed out before ever constructing a
   /// guard, which [`renew`](crate::lease::renew) does.
   pub fn arm(secs: u32) -> Result<Self> {
      let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
      action.sa_sigaction = alarm_fired as usize;
      // SAFETY: `action` is a validly initialized `sigaction` for a plain
      // handler (not `SA_SIGINFO`); `sigemptyset` only touches `action`.
      unsafe {
         libc::sigemptyset(&mut action.sa_mask);
      }
      action.sa_flags = 0;

      let mut previous: libc::sigaction = unsafe { std::mem::zeroed() };
      // SAFETY: `action` and `previous` are both valid `sigaction`
      // pointers of the correct size for this platform.
      let rc = unsafe { libc::sigaction(libc::SIGALRM, &action, &mut previous) };
      if rc != 0 {
         return Err(Error::SignalSetup(std::io::Error::last_os_error()));
      }

      ALARM_ARMED.store(true, Ordering::SeqCst);
      // SAFETY: `alarm` takes a plain integer; no pointers involved.
      unsafe {
         libc::alarm(secs);
      }
      Ok(Self { previous })
   }
}

impl Drop for AlarmGuard {
   fn drop(&mut self) {
      // SAFETY: `alarm(0)` cancels any pending alarm for this process.
      unsafe {
         libc::alarm(0);
      }
      ALARM_ARMED.store(false, Ordering::SeqCst);
      // SAFETY: restoring whatever handler was previously installed.
      unsafe {
         libc::sigaction(libc::SIGALRM, &self.previous, std::ptr::null_mut());
      }
   }
}

extern "C" fn terminate(_signum: libc::c_int) {
   // SAFETY: `_exit` is async-signal-safe; orderly termination intentionally
   // skips Rust destructors (the sector may hold a live lease, and explicit
   // release is the caller's responsibility per the protocol's design).
   unsafe {
      libc::_exit(0);
   }
}

/// Installs handlers for `SIGTERM`/`SIGINT` that exit(0) without attempting
/// any cleanup of the sector.
pub fn install_termination_handler() -> Result<()> {
   let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
   action.sa_sigaction = terminate as usize;
   // SAFETY: initializing a plain (non-`SA_SIGINFO`) handler's mask.
   unsafe {
      libc::sigemptyset(&mut action.sa_mask);
   }
   action.sa_flags = 0;

   for sig in [libc::SIGTERM, libc::SIGINT] {
      // SAFETY: `action` is a valid, fully initialized `sigaction`.
      let rc = unsafe { libc::sigaction(sig, &action, std::ptr::null_mut()) };
      if rc != 0 {
         return Err(Error::SignalSetup(std::io::Error::last_os_error()));
      }
   }
   Ok(())
}
