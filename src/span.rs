//! Source positions shared by the input AST and the lowered IR.
//!
//! Positions are plain value triples (file id, byte offset, length) so that
//! lowered trees copy them instead of holding the originating AST alive.

use std::path::{Path, PathBuf};

/// Index into a [`SourceRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(pub u32);

/// Byte range inside one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRange {
    pub file: FileId,
    pub start: u32,
    pub len: u32,
}

impl SourceRange {
    pub fn new(file: FileId, start: u32, len: u32) -> Self {
        Self { file, start, len }
    }

    pub fn end(&self) -> u32 {
        self.start + self.len
    }
}

/// Maps `FileId`s back to the paths the collector read them from.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    paths: Vec<PathBuf>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, path: PathBuf) -> FileId {
        if let Some(index) = self.paths.iter().position(|known| known == &path) {
            return FileId(index as u32);
        }
        self.paths.push(path);
        FileId((self.paths.len() - 1) as u32)
    }

    pub fn path(&self, file: FileId) -> Option<&Path> {
        self.paths.get(file.0 as usize).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent_per_path() {
        let mut registry = SourceRegistry::new();
        let first = registry.intern(PathBuf::from("a/b.py"));
        let second = registry.intern(PathBuf::from("a/c.py"));
        let again = registry.intern(PathBuf::from("a/b.py"));

        assert_eq!(first, again);
        assert_ne!(first, second);
        assert_eq!(registry.path(first), Some(Path::new("a/b.py")));
        assert_eq!(registry.len(), 2);
    }
}
