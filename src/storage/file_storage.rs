use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::SessionStorage;
use crate::error::AuthError;
use crate::models::Session;

/// Persists the session as a single JSON document on disk.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStorage for FileStorage {
    /// A missing or corrupt file both mean no session; corruption is logged.
    async fn load_session(&self) -> Result<Option<Session>, AuthError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No persisted session at '{}'", self.path.display());
                return Ok(None);
            }
            Err(e) => {
                return Err(AuthError::Storage(format!(
                    "Failed to read '{}': {}",
                    self.path.display(),
                    e
                )))
            }
        };

        match serde_json::from_slice::<Session>(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(
                    "Ignoring unreadable session file '{}': {}",
                    self.path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    async fn save_session(&self, session: &Session) -> Result<(), AuthError> {
        let body = serde_json::to_vec_pretty(session)
            .map_err(|e| AuthError::Storage(format!("Failed to encode session: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AuthError::Storage(format!("Failed to create '{}': {}", parent.display(), e))
            })?;
        }

        // Write then rename: readers only ever see a complete file.
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| AuthError::Storage(format!("Failed to write '{}': {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            AuthError::Storage(format!("Failed to replace '{}': {}", self.path.display(), e))
        })?;

        debug!("Persisted session to '{}'", self.path.display());
        Ok(())
    }

    async fn clear_session(&self) -> Result<(), AuthError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Storage(format!(
                "Failed to remove '{}': {}",
                self.path.display(),
                e
            ))),
        }
    }
}
