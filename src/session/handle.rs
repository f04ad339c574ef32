use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::AuthError;
use crate::models::AuthState;

/// Read access to the auth state owned by a [`SessionStore`](super::SessionStore).
///
/// Handles are cheap to clone. Every read fails with
/// [`AuthError::ContextUnavailable`] once the owning store has been torn down.
#[derive(Clone)]
pub struct AuthHandle {
    rx: watch::Receiver<AuthState>,
    closed: Arc<AtomicBool>,
}

impl AuthHandle {
    pub(crate) fn new(rx: watch::Receiver<AuthState>, closed: Arc<AtomicBool>) -> Self {
        Self { rx, closed }
    }

    /// Set by the store on teardown or drop, before its task has wound down.
    fn ensure_open(&self) -> Result<(), AuthError> {
        if self.closed.load(Ordering::Acquire) {
            Err(AuthError::ContextUnavailable)
        } else {
            Ok(())
        }
    }

    /// Snapshot of the current `{session, user, loading}`.
    pub fn current(&self) -> Result<AuthState, AuthError> {
        self.ensure_open()?;
        self.rx
            .has_changed()
            .map_err(|_| AuthError::ContextUnavailable)?;
        Ok(self.rx.borrow().clone())
    }

    /// Wait for the next state change and return it. Marks the new state as seen.
    pub async fn changed(&mut self) -> Result<AuthState, AuthError> {
        self.ensure_open()?;
        self.rx
            .changed()
            .await
            .map_err(|_| AuthError::ContextUnavailable)?;
        Ok(self.rx.borrow_and_update().clone())
    }

    /// Current state, marking it as seen so the next [`changed`](Self::changed)
    /// only fires for newer ones.
    pub fn current_and_mark_seen(&mut self) -> Result<AuthState, AuthError> {
        self.ensure_open()?;
        self.rx
            .has_changed()
            .map_err(|_| AuthError::ContextUnavailable)?;
        Ok(self.rx.borrow_and_update().clone())
    }

    /// Wait until the initial session check has resolved.
    pub async fn wait_until_loaded(&mut self) -> Result<AuthState, AuthError> {
        self.ensure_open()?;
        let state = self
            .rx
            .wait_for(|state| !state.is_loading())
            .await
            .map_err(|_| AuthError::ContextUnavailable)?;
        Ok(state.clone())
    }
}
