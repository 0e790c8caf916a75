//! Per-path mutual exclusion.
//!
//! [`convert`](crate::imaging::convert) checks for an existing WebP and then
//! writes one. Two calls for the same source can both pass the check; the
//! no-clobber rename keeps the first output, but both still pay for a full
//! encode. [`PathLocks`] lets a caller serialize all work on one file while
//! unrelated files proceed in parallel.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// A set of mutexes keyed by canonical file path.
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `path`.
    ///
    /// Paths are canonicalized first so `./a.jpg` and `a.jpg` share a lock;
    /// a path that cannot be canonicalized (e.g. missing) is used as given.
    /// A panic inside `f` does not wedge later callers.
    pub fn with_lock<T>(&self, path: &Path, f: impl FnOnce() -> T) -> T {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key).or_default())
        };

        let _held = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Number of distinct paths seen so far.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
