use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{file_storage::FileStorage, no_storage::NoStorage};
use crate::config::{StorageBackend, StorageConfig, DEFAULT_SESSION_PATH};
use crate::error::AuthError;
use crate::models::Session;

/// The SessionStorage trait abstracts where the cached session is persisted
/// between runs (load, save, clear).
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn load_session(&self) -> Result<Option<Session>, AuthError>;
    async fn save_session(&self, session: &Session) -> Result<(), AuthError>;
    async fn clear_session(&self) -> Result<(), AuthError>;
    fn is_enabled(&self) -> bool {
        // Real backends persist; NoStorage overrides this so logs can say so
        true
    }
}

/// Creates a concrete storage implementation based on the StorageConfig.
/// Persistence is off (NoStorage) when `persist` is false or storage is
/// disabled. Without a configured backend the session goes to a file at
/// [`DEFAULT_SESSION_PATH`].
pub fn create_storage(config: &StorageConfig, persist: bool) -> Arc<dyn SessionStorage> {
    if !persist || !config.enabled {
        info!("Session persistence is disabled. Using NoStorage.");
        return Arc::new(NoStorage::new());
    }

    match &config.backend {
        Some(StorageBackend::File(file_config)) => {
            info!("Persisting sessions to '{}'", file_config.path);
            Arc::new(FileStorage::new(&file_config.path))
        }
        None => {
            info!("Persisting sessions to default path '{}'", DEFAULT_SESSION_PATH);
            Arc::new(FileStorage::new(DEFAULT_SESSION_PATH))
        }
    }
}
