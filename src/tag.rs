//! Sector tag codec — the 32-byte identity+timestamp record at the front of a lease sector.

use std::fmt;

/// Bytes of the identity field.
pub const IDLEN: usize = 16;
/// Bytes of the hex timestamp field.
pub const STAMPLEN: usize = 16;
/// Total tag width.
pub const TAGLEN: usize = IDLEN + STAMPLEN;

/// The literal value written to a sector with no holder.
pub const SENTINEL_STR: &str = "------FREE------0000000000000000";

/// A 32-byte on-disk identity+timestamp record.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag([u8; TAGLEN]);

impl Tag {
   /// Returns the sentinel ("free") tag.
   pub fn sentinel() -> Self {
      let mut bytes = [0u8; TAGLEN];
      bytes.copy_from_slice(SENTINEL_STR.as_bytes());
      Self(bytes)
   }

   /// Builds a tag from an identity (space-padded, left-justified, truncated to
   /// `IDLEN` bytes) and a microsecond timestamp (zero-padded lowercase hex).
   pub fn build(identity: &str, ts: u64) -> Self {
      let mut bytes = [b' '; TAGLEN];
      let id_bytes = identity.as_bytes();
      let copy_len = id_bytes.len().min(IDLEN);
      bytes[..copy_len].copy_from_slice(&id_bytes[..copy_len]);
      let stamp = format!("{ts:0width$x}", width = STAMPLEN);
      bytes[IDLEN..].copy_from_slice(stamp.as_bytes());
      Self(bytes)
   }

   /// Reconstructs a tag from raw sector bytes (only the first `TAGLEN` bytes
   /// are consulted).
   pub fn from_bytes(bytes: &[u8]) -> Self {
      let mut out = [0u8; TAGLEN];
      let copy_len = bytes.len().min(TAGLEN);
      out[..copy_len].copy_from_slice(&bytes[..copy_len]);
      Self(out)
   }

   /// The raw 32 bytes, suitable for writing to a sector.
   pub fn as_bytes(&self) -> &[u8; TAGLEN] {
      &self.0
   }

   /// Splits the tag into its unpadded identity and parsed timestamp.
   ///
   /// Returns `ts = 0` if the timestamp field is not valid hex (e.g. the
   /// sentinel's all-zero field already parses to zero correctly).
   pub fn parse(&self) -> (String, u64) {
      let identity = String::from_utf8_lossy(&self.0[..IDLEN])
         .trim_end()
         .to_string();
      let stamp = std::str::from_utf8(&self.0[IDLEN..]).unwrap_or("0");
      let ts = u64::from_str_radix(stamp, 16).unwrap_or(0);
      (identity, ts)
   }

   /// `true` iff this tag is byte-for-byte the sentinel.
   pub fn is_free(&self) -> bool {
      *self == Self::sentinel()
   }

   /// `true` iff the identity field matches `identity`'s space-padded encoding.
   pub fn same_identity(&self, identity: &str) -> bool {
      let mut padded = [b' '; IDLEN];
      let id_bytes = identity.as_bytes();
      let copy_len = id_bytes.len().min(IDLEN);
      padded[..copy_len].copy_from_slice(&id_bytes[..copy_len]);
      self.0[..IDLEN] == padded
   }
}

impl fmt::Debug for Tag {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      let (identity, ts) = self.parse();
      f.debug_struct("Tag").field("identity", &identity).field("ts", &ts).finish()
   }
}

#[cfg(test)]
mod tests {
   use super::*;

   #[test]
   fn sentinel_is_free() {
      assert!(Tag::sentinel().is_free());
   }

   #[test]
   fn sentinel_matches_literal_bytes() {
      assert_eq!(Tag::sentinel().as_bytes(), SENTINEL_STR.as_bytes());
   }

   #[test]
   fn build_then_parse_round_trips() {
      let tag = Tag::build("host-a", 1_234_567);
      let (identity, ts) = tag.parse();
      assert_eq!(identity, "host-a");
      assert_eq!(ts, 1_234_567);
   }

   #[test]
   fn build_pads_short_identity() {
      let tag = Tag::build("x", 0);
      assert!(tag.same_identity("x"));
      assert!(!tag.same_identity("xx"));
   }

   #[test]
   fn build_truncates_long_identity() {
      let tag = Tag::build("0123456789abcdefGHI", 42);
      let (identity, ts) = tag.parse();
      assert_eq!(identity, "0123456789abcdef");
      assert_eq!(ts, 42);
   }

   #[test]
   fn non_free_tag_is_not_free() {
      assert!(!Tag::build("a", 1).is_free());
      assert!(!Tag::build("", 1).is_free());
      // An empty identity with ts == 0 would equal the sentinel only if the
      // padded identity also matched the sentinel's literal text, which it
      // does not ("------FREE------" vs 16 spaces).
      assert!(!Tag::build("", 0).is_free());
   }

   #[test]
   fn same_tag_is_byte_equality() {
      let a = Tag::build("node1", 99);
      let b = Tag::build("node1", 99);
      let c = Tag::build("node1", 100);
      assert_eq!(a, b);
      assert_ne!(a, c);
   }

   mod proptests {
      use proptest::prelude::*;

      use super::*;

      proptest! {
         #[test]
         fn round_trip_any_short_identity_and_ts(
            identity in "[A-Za-z0-9_-]{0,15}",
            ts in any::<u64>(),
         ) {
            let tag = Tag::build(&identity, ts);
            let (parsed_id, parsed_ts) = tag.parse();
            prop_assert_eq!(parsed_id, identity);
            prop_assert_eq!(parsed_ts, ts);
         }
      }
   }
}
