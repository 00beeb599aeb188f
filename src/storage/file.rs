//! File-system storage implementation.

use std::path::{Path, PathBuf};

use crate::error::{Result, SagittaError};
use crate::storage::Storage;

/// Directory-backed storage.
///
/// File names are flat: path separators are rejected so stored models can
/// never escape the root directory.
#[derive(Debug)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open (creating if necessary) a storage directory.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(FileStorage { root })
    }

    /// The root directory of this storage.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(SagittaError::invalid_argument(format!(
                "invalid storage file name: {name}"
            )));
        }
        Ok(self.root.join(name))
    }
}

impl Storage for FileStorage {
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.resolve(name)?;
        std::fs::read(&path)
            .map_err(|e| SagittaError::storage(format!("failed to read {name}: {e}")))
    }

    fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve(name)?;
        // Write to a temporary sibling, then rename, so a crash mid-write
        // never leaves a truncated model file under the final name.
        let tmp = self.root.join(format!(".{name}.tmp"));
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn file_exists(&self, name: &str) -> bool {
        self.resolve(name).map(|path| path.is_file()).unwrap_or(false)
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file()
                && let Some(name) = entry.file_name().to_str()
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        let path = self.resolve(name)?;
        std::fs::remove_file(&path)
            .map_err(|e| SagittaError::storage(format!("failed to delete {name}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        storage.write("model.bin", b"weights").unwrap();
        assert!(storage.file_exists("model.bin"));
        assert_eq!(storage.read("model.bin").unwrap(), b"weights");
    }

    #[test]
    fn test_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("models");
        let storage = FileStorage::new(&nested).unwrap();
        assert!(nested.is_dir());
        storage.write("a", b"1").unwrap();
        assert_eq!(storage.list_files().unwrap(), vec!["a"]);
    }

    #[test]
    fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        assert!(storage.write("../escape", b"x").is_err());
        assert!(storage.write("a/b", b"x").is_err());
        assert!(storage.read("").is_err());
    }

    #[test]
    fn test_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path()).unwrap();

        storage.write("gone.bin", b"x").unwrap();
        storage.delete_file("gone.bin").unwrap();
        assert!(!storage.file_exists("gone.bin"));
        assert!(storage.delete_file("gone.bin").is_err());
    }
}
