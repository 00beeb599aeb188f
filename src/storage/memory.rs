//! In-memory storage implementation for testing and ephemeral sessions.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{Result, SagittaError};
use crate::storage::Storage;

/// An in-memory storage implementation.
///
/// Useful for tests and for fitting/loading models without touching disk.
/// Cloning shares the underlying file map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    files: Arc<Mutex<HashMap<String, Box<[u8]>>>>,
}

impl MemoryStorage {
    /// Create a new, empty memory storage.
    pub fn new() -> Self {
        MemoryStorage {
            files: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of files stored.
    pub fn file_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    /// Total size of all files in bytes.
    pub fn total_size(&self) -> u64 {
        let files = self.files.lock().unwrap();
        files.values().map(|data| data.len() as u64).sum()
    }

    /// Remove all files.
    pub fn clear(&self) {
        self.files.lock().unwrap().clear();
    }
}

impl Storage for MemoryStorage {
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let files = self.files.lock().unwrap();
        files
            .get(name)
            .map(|data| data.to_vec())
            .ok_or_else(|| SagittaError::storage(format!("file not found: {name}")))
    }

    fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        let mut files = self.files.lock().unwrap();
        files.insert(name.to_string(), data.to_vec().into_boxed_slice());
        Ok(())
    }

    fn file_exists(&self, name: &str) -> bool {
        self.files.lock().unwrap().contains_key(name)
    }

    fn list_files(&self) -> Result<Vec<String>> {
        let files = self.files.lock().unwrap();
        let mut names: Vec<String> = files.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        let mut files = self.files.lock().unwrap();
        files
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| SagittaError::storage(format!("file not found: {name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_roundtrip() {
        let storage = MemoryStorage::new();
        storage.write("a.bin", b"hello").unwrap();

        assert!(storage.file_exists("a.bin"));
        assert_eq!(storage.read("a.bin").unwrap(), b"hello");
        assert_eq!(storage.file_count(), 1);
        assert_eq!(storage.total_size(), 5);
    }

    #[test]
    fn test_write_replaces() {
        let storage = MemoryStorage::new();
        storage.write("a.bin", b"one").unwrap();
        storage.write("a.bin", b"two").unwrap();
        assert_eq!(storage.read("a.bin").unwrap(), b"two");
    }

    #[test]
    fn test_missing_file() {
        let storage = MemoryStorage::new();
        assert!(!storage.file_exists("ghost"));
        assert!(storage.read("ghost").is_err());
        assert!(storage.delete_file("ghost").is_err());
    }

    #[test]
    fn test_list_and_delete() {
        let storage = MemoryStorage::new();
        storage.write("b.bin", b"2").unwrap();
        storage.write("a.bin", b"1").unwrap();

        assert_eq!(storage.list_files().unwrap(), vec!["a.bin", "b.bin"]);

        storage.delete_file("a.bin").unwrap();
        assert_eq!(storage.list_files().unwrap(), vec!["b.bin"]);
    }
}
