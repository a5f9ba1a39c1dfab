//! Baseline fingerprints
//!
//! Every tracked file keeps a [`ContentHash`] of the wrapper-stripped value
//! it was pulled (or last pushed) with. Change detection compares against
//! this fingerprint rather than re-reading the remote record.

use serde::{Serialize, Serializer};
use std::fmt;

/// Blake3 fingerprint of a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Fingerprint of a text value
    #[inline]
    #[must_use]
    pub fn of_text(text: &str) -> Self {
        Self(*blake3::hash(text.as_bytes()).as_bytes())
    }

    /// True when `text` has this fingerprint
    #[inline]
    #[must_use]
    pub fn matches(&self, text: &str) -> bool {
        *self == Self::of_text(text)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
