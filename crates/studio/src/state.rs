//! Application state shared across handlers.

use std::sync::Arc;

use persona_studio_core::{DescriptionStore, Studio};
use tokio::sync::{Mutex, MutexGuard};

use crate::config::StudioConfig;
use crate::error::AppError;
use crate::gateway::{GatewayError, GenerationClient};
use crate::storage::FileDescriptionStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The studio sits behind an
/// async mutex; handlers must release the guard before awaiting the
/// generator.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    gateway: GenerationClient,
    studio: Arc<Mutex<Studio>>,
}

impl AppState {
    /// Create a new application state with a file-backed description store
    /// in the configured data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the generator client cannot be built.
    pub fn new(config: &StudioConfig) -> Result<Self, GatewayError> {
        let descriptions = Arc::new(FileDescriptionStore::new(&config.data_dir));
        Self::with_description_store(config, descriptions)
    }

    /// Create a new application state with the given description store.
    ///
    /// # Errors
    ///
    /// Returns an error if the generator client cannot be built.
    pub fn with_description_store(
        config: &StudioConfig,
        descriptions: Arc<dyn DescriptionStore>,
    ) -> Result<Self, GatewayError> {
        let gateway = GenerationClient::new(&config.generator)?;
        let studio = if config.seed_sample {
            Studio::with_sample_persona(descriptions)
        } else {
            Studio::new(descriptions)
        };

        Ok(Self {
            inner: Arc::new(AppStateInner {
                gateway,
                studio: Arc::new(Mutex::new(studio)),
            }),
        })
    }

    /// Get a reference to the persona generator client.
    #[must_use]
    pub fn gateway(&self) -> &GenerationClient {
        &self.inner.gateway
    }

    /// Lock the studio.
    ///
    /// Only for work that never touches the description store.
    pub async fn studio(&self) -> MutexGuard<'_, Studio> {
        self.inner.studio.lock().await
    }

    /// Lock the studio and run `f` on the blocking pool.
    ///
    /// Anything that may read or write the description store goes through
    /// here, since store implementations do synchronous file I/O.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if `f` panics.
    pub async fn with_studio_blocking<T, F>(&self, f: F) -> crate::error::Result<T>
    where
        F: FnOnce(&mut Studio) -> T + Send + 'static,
        T: Send + 'static,
    {
        let mut studio = Arc::clone(&self.inner.studio).lock_owned().await;
        tokio::task::spawn_blocking(move || f(&mut studio))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))
    }
}
