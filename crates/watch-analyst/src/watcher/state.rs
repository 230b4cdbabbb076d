use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Paths successfully handled during this process lifetime.
///
/// Grows monotonically; there is no removal. A restart starts empty.
#[derive(Debug, Default, Clone)]
pub struct ProcessedFileSet {
    paths: HashSet<PathBuf>,
}

impl ProcessedFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Record a path. Returns `false` if it was already present.
    pub fn insert(&mut self, path: impl Into<PathBuf>) -> bool {
        self.paths.insert(path.into())
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }
}
