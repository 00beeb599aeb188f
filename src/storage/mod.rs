//! Pluggable storage backends for persisted model state.
//!
//! Fitted models are opaque blobs to the storage layer: whole files are
//! written and read in one shot. [`MemoryStorage`] backs tests and
//! throwaway sessions; [`FileStorage`] backs a directory on disk.

pub mod file;
pub mod memory;
pub mod model_store;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use model_store::ModelStore;

use crate::error::Result;

/// A trait for storage backends that can store and retrieve named files.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Read the whole contents of a file.
    fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Write the whole contents of a file, replacing any previous version.
    fn write(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Check if a file exists.
    fn file_exists(&self, name: &str) -> bool;

    /// List all files in the storage.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Delete a file.
    fn delete_file(&self, name: &str) -> Result<()>;
}
