use super::SessionStorage;
use crate::error::AuthError;
use crate::models::Session;
use async_trait::async_trait;

/// A storage that persists nothing: sessions only live as long as the process.
pub struct NoStorage;

impl NoStorage {
    pub fn new() -> Self {
        NoStorage
    }
}

impl Default for NoStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStorage for NoStorage {
    async fn load_session(&self) -> Result<Option<Session>, AuthError> {
        Ok(None)
    }

    async fn save_session(&self, _session: &Session) -> Result<(), AuthError> {
        Ok(())
    }

    async fn clear_session(&self) -> Result<(), AuthError> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
