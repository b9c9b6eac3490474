//! Path interning for the file-level graph
//!
//! Each unique file path is stored once and referenced by a small key, so
//! graph nodes carry 4-byte keys instead of owned paths and comparisons
//! during traversal are integer comparisons.

use lasso::{Rodeo, Spur};
use std::path::Path;

/// A path key - small (4 bytes) reference to an interned path
pub type PathKey = Spur;

/// Single-threaded path interner, filled during the reduce phase
#[derive(Debug, Default)]
pub struct PathInterner {
    inner: Rodeo,
}

impl PathInterner {
    pub fn new() -> Self {
        Self {
            inner: Rodeo::default(),
        }
    }

    /// Intern a path, returning a key.
    /// If the path was already interned, returns the existing key
    #[inline]
    pub fn intern(&mut self, path: &Path) -> PathKey {
        self.inner.get_or_intern(path.to_string_lossy())
    }

    /// Get the path string for a key
    #[inline]
    pub fn resolve(&self, key: PathKey) -> &str {
        self.inner.resolve(&key)
    }

    /// Key for an already-interned path
    #[inline]
    pub fn get(&self, path: &Path) -> Option<PathKey> {
        self.inner.get(path.to_string_lossy())
    }

    /// Number of unique paths interned
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
