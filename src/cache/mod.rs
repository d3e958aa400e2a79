//! Persistent cache of dependency working copies
//!
//! Working copies are keyed by a digest of the dependency's remote URL and
//! shared across runs. Every read or write of a working copy or its metadata
//! happens under that key's lock.
//!
//! # Locking Model
//!
//! | Lock | Scope | On contention |
//! |------|-------|---------------|
//! | System | whole cache root, held for a run | fail with `LockUnavailable` |
//! | Key | one working copy + metadata | wait |

pub mod key;
pub mod store;

pub use key::CacheKey;
pub use store::{CacheStore, KeyLock, RepoInfo, SystemLock};
