//! Interned canonical paths for cheap copying and O(1) equality comparison.

use lasso::Rodeo;
use serde::{Deserialize, Serialize};

/// A unique key for one canonical file path seen during a run.
///
/// Keys are interned strings represented as a `u32` index into a
/// [`PathInterner`]. Interning the same path twice yields the same key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct PathKey(u32);

impl PathKey {
    /// Creates a `PathKey` from a raw `u32` index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index of this key.
    pub fn as_raw(self) -> u32 {
        self.0
    }
}

// SAFETY: `PathKey` wraps a `u32` which is always a valid `usize` on 32-bit and
// 64-bit platforms. `try_from_usize` rejects values that don't fit in `u32`.
unsafe impl lasso::Key for PathKey {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(PathKey)
    }
}

/// Single-threaded path interner backed by [`lasso::Rodeo`].
///
/// Paths are interned in their normalized string form (forward slashes), so
/// the same file reached through different spellings maps to one key once the
/// caller has canonicalized it.
#[derive(Debug)]
pub struct PathInterner {
    rodeo: Rodeo<PathKey>,
}

impl PathInterner {
    /// Creates a new empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: Rodeo::new(),
        }
    }

    /// Interns a path, returning its [`PathKey`]. If the path was already
    /// interned, returns the existing key without allocating.
    pub fn get_or_intern(&mut self, path: &str) -> PathKey {
        self.rodeo.get_or_intern(path)
    }

    /// Returns the key of an already interned path.
    pub fn get(&self, path: &str) -> Option<PathKey> {
        self.rodeo.get(path)
    }

    /// Resolves a [`PathKey`] back to its path string.
    ///
    /// # Panics
    ///
    /// Panics if the key was not created by this interner.
    pub fn resolve(&self, key: PathKey) -> &str {
        self.rodeo.resolve(&key)
    }

    /// Returns the number of interned paths.
    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    /// Returns `true` if nothing has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for PathInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_resolve_roundtrip() {
        let mut interner = PathInterner::new();
        let key = interner.get_or_intern("/src/main.c");
        assert_eq!(interner.resolve(key), "/src/main.c");
    }

    #[test]
    fn same_path_same_key() {
        let mut interner = PathInterner::new();
        let a = interner.get_or_intern("/inc/a.h");
        let b = interner.get_or_intern("/inc/a.h");
        assert_eq!(a, b);
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn different_paths_different_keys() {
        let mut interner = PathInterner::new();
        let a = interner.get_or_intern("/inc/a.h");
        let b = interner.get_or_intern("/inc/b.h");
        assert_ne!(a, b);
    }

    #[test]
    fn get_without_interning() {
        let mut interner = PathInterner::new();
        assert!(interner.get("/inc/a.h").is_none());
        let key = interner.get_or_intern("/inc/a.h");
        assert_eq!(interner.get("/inc/a.h"), Some(key));
    }

    #[test]
    fn serde_roundtrip() {
        let key = PathKey(42);
        let json = serde_json::to_string(&key).unwrap();
        let back: PathKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, back);
    }
}
