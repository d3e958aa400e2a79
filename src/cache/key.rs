//! Cache key derivation
//!
//! A key is the SHA256 of a dependency's canonical remote URL, hex encoded.
//! Same remote = same key; the key doubles as a directory and lock file name.

use sha2::{Digest, Sha256};
use std::fmt;

/// Filesystem-safe digest of a remote URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a remote URL
    pub fn from_remote(remote: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(remote.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
