//! Persistence of the product description between sessions.
//!
//! Only the description text survives a restart. Personas and drafts live in
//! memory.

use std::sync::{Mutex, PoisonError};

/// Key under which the description is persisted.
pub const DESCRIPTION_KEY: &str = "productDescription";

/// Errors raised by a [`DescriptionStore`].
#[derive(Debug, thiserror::Error)]
pub enum DescriptionStoreError {
    #[error("description storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored description is malformed: {0}")]
    Format(String),
}

/// A place to keep the last product description.
pub trait DescriptionStore: Send + Sync {
    /// Load the saved description, if one was ever saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn load(&self) -> Result<Option<String>, DescriptionStoreError>;

    /// Overwrite the saved description.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, description: &str) -> Result<(), DescriptionStoreError>;
}

/// Description store that forgets everything on restart.
#[derive(Debug, Default)]
pub struct MemoryDescriptionStore {
    value: Mutex<Option<String>>,
}

impl MemoryDescriptionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `description`.
    #[must_use]
    pub fn with_description(description: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(description.into())),
        }
    }
}

impl DescriptionStore for MemoryDescriptionStore {
    fn load(&self) -> Result<Option<String>, DescriptionStoreError> {
        Ok(self
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, description: &str) -> Result<(), DescriptionStoreError> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(description.to_owned());
        Ok(())
    }
}
