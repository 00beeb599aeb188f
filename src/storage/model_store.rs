//! Named persistence for fitted model state.
//!
//! A [`ModelStore`] saves a fitted model under a name string as two files:
//! a bincode blob with the matrices and vocabulary, and a small JSON
//! metadata record carrying the model kind and format version so a load can
//! refuse mismatched state. Persistence is always explicit: fitting a model
//! never writes storage.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SagittaError};
use crate::model::ModelKind;
use crate::storage::Storage;

/// On-disk format version for persisted models.
const FORMAT_VERSION: u32 = 1;

/// Metadata stored beside each persisted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelMeta {
    name: String,
    kind: ModelKind,
    format_version: u32,
}

/// Saves and loads fitted models by name over any [`Storage`] backend.
#[derive(Debug, Clone)]
pub struct ModelStore {
    storage: Arc<dyn Storage>,
}

impl ModelStore {
    /// Create a model store over the given storage backend.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        ModelStore { storage }
    }

    fn blob_name(name: &str) -> String {
        format!("{name}.model.bin")
    }

    fn meta_name(name: &str) -> String {
        format!("{name}.meta.json")
    }

    /// Persist a fitted model's state under `name`, replacing any previous
    /// save.
    pub fn save<T: Serialize>(&self, name: &str, kind: ModelKind, state: &T) -> Result<()> {
        let blob = bincode::serialize(state).map_err(|e| {
            SagittaError::serialization(format!("failed to encode model '{name}': {e}"))
        })?;

        let meta = ModelMeta {
            name: name.to_string(),
            kind,
            format_version: FORMAT_VERSION,
        };
        let meta_json = serde_json::to_vec_pretty(&meta)?;

        self.storage.write(&Self::blob_name(name), &blob)?;
        self.storage.write(&Self::meta_name(name), &meta_json)?;
        Ok(())
    }

    /// Load a previously saved model's state.
    ///
    /// Fails with [`SagittaError::ModelNotFound`] when no save exists under
    /// `name`, and with [`SagittaError::InvalidArgument`] when the persisted
    /// state belongs to a different model kind.
    pub fn load<T: DeserializeOwned>(&self, name: &str, kind: ModelKind) -> Result<T> {
        if !self.storage.file_exists(&Self::blob_name(name)) {
            return Err(SagittaError::model_not_found(format!(
                "no persisted model under name '{name}'"
            )));
        }

        let meta_bytes = self.storage.read(&Self::meta_name(name)).map_err(|_| {
            SagittaError::model_not_found(format!("persisted model '{name}' has no metadata"))
        })?;
        let meta: ModelMeta = serde_json::from_slice(&meta_bytes)?;

        if meta.kind != kind {
            return Err(SagittaError::invalid_argument(format!(
                "model '{name}' was saved as {} but requested as {}",
                meta.kind, kind
            )));
        }
        if meta.format_version != FORMAT_VERSION {
            return Err(SagittaError::serialization(format!(
                "model '{name}' uses format version {}, expected {FORMAT_VERSION}",
                meta.format_version
            )));
        }

        let blob = self.storage.read(&Self::blob_name(name))?;
        bincode::deserialize(&blob).map_err(|e| {
            SagittaError::serialization(format!("failed to decode model '{name}': {e}"))
        })
    }

    /// Whether a persisted model exists under `name`.
    pub fn exists(&self, name: &str) -> bool {
        self.storage.file_exists(&Self::blob_name(name))
    }

    /// Delete a persisted model.
    pub fn delete(&self, name: &str) -> Result<()> {
        if !self.exists(name) {
            return Err(SagittaError::model_not_found(format!(
                "no persisted model under name '{name}'"
            )));
        }
        self.storage.delete_file(&Self::blob_name(name))?;
        // A blob without metadata is possible after a partial delete.
        if self.storage.file_exists(&Self::meta_name(name)) {
            self.storage.delete_file(&Self::meta_name(name))?;
        }
        Ok(())
    }

    /// Names of all persisted models.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for file in self.storage.list_files()? {
            if let Some(name) = file.strip_suffix(".model.bin") {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}
