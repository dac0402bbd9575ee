//! File-backed description store.
//!
//! The description lives in `<data_dir>/description.json` as
//! `{"productDescription": "..."}`. Writes go to a temporary file that is
//! renamed over the old one.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use persona_studio_core::{DESCRIPTION_KEY, DescriptionStore, DescriptionStoreError};
use serde_json::{Map, Value};

/// File name of the stored description inside the data directory.
pub const DESCRIPTION_FILE: &str = "description.json";

/// Description store backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileDescriptionStore {
    path: PathBuf,
}

impl FileDescriptionStore {
    /// Create a store keeping its file in `data_dir`.
    ///
    /// Nothing is touched on disk until the first save.
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(DESCRIPTION_FILE),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DescriptionStore for FileDescriptionStore {
    fn load(&self) -> Result<Option<String>, DescriptionStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let value: Value = serde_json::from_str(&raw)
            .map_err(|e| DescriptionStoreError::Format(e.to_string()))?;
        match value.get(DESCRIPTION_KEY) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(description)) => Ok(Some(description.clone())),
            Some(_) => Err(DescriptionStoreError::Format(format!(
                "{DESCRIPTION_KEY} must be a string"
            ))),
        }
    }

    fn save(&self, description: &str) -> Result<(), DescriptionStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut document = Map::new();
        document.insert(
            DESCRIPTION_KEY.to_owned(),
            Value::String(description.to_owned()),
        );
        let body = serde_json::to_vec_pretty(&Value::Object(document))
            .map_err(|e| DescriptionStoreError::Format(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;

        tracing::debug!(path = %self.path.display(), "Saved product description");
        Ok(())
    }
}
