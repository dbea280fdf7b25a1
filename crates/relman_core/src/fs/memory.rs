//! In-memory filesystem implementation.
//!
//! Uses `Arc<Mutex<HashMap>>` so clones share the same underlying storage.

use std::collections::HashMap;
use std::io::{Error, ErrorKind, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::FileSystem;

/// A filesystem that keeps files in memory.
#[derive(Clone, Default)]
pub struct InMemoryFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, String>>>,
}

impl InMemoryFileSystem {
    /// Create a new empty filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file (builder pattern).
    pub fn with_file(self, path: impl Into<PathBuf>, content: &str) -> Self {
        self.lock().insert(path.into(), content.to_string());
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, String>> {
        // A poisoned map is still structurally valid
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl FileSystem for InMemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.lock().get(path).cloned().ok_or_else(|| {
            Error::new(
                ErrorKind::NotFound,
                format!("File not found: {}", path.display()),
            )
        })
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        self.lock().insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn create_dir_all(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_storage() {
        let fs = InMemoryFileSystem::new().with_file("a.json", "1");
        let other = fs.clone();
        other.write_file(Path::new("b.json"), "2").unwrap();

        assert_eq!(fs.read_to_string(Path::new("a.json")).unwrap(), "1");
        assert_eq!(fs.read_to_string(Path::new("b.json")).unwrap(), "2");
        assert!(fs.read_to_string(Path::new("missing.json")).is_err());
    }
}
