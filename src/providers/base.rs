use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use super::subscription::Subscription;
use crate::error::AuthError;
use crate::models::{Session, User};

/// Email/password pair for password sign-in.
#[derive(Serialize, Clone, PartialEq, Eq)]
pub struct PasswordCredentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A new account request. `data` becomes the user's `user_metadata`.
#[derive(Serialize, Clone, PartialEq)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub data: Map<String, Value>,
}

impl fmt::Debug for SignUpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignUpRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("data", &self.data)
            .finish()
    }
}

/// Outcome of a sign-up. A user without a session means the provider wants
/// the email address confirmed before the first login.
#[derive(Debug, Clone, PartialEq)]
pub struct SignUpResponse {
    pub user: Option<User>,
    pub session: Option<Session>,
}

impl SignUpResponse {
    pub fn requires_confirmation(&self) -> bool {
        self.user.is_some() && self.session.is_none()
    }
}

/// A hosted identity provider: issues sessions and notifies listeners
/// whenever the session changes.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn get_name(&self) -> &str;

    /// The current session, restored from storage and refreshed if it is
    /// about to expire. `None` when nobody is signed in.
    async fn get_session(&self) -> Result<Option<Session>, AuthError>;

    /// Register for change notifications (sign-in, sign-out, refresh).
    fn on_auth_state_change(&self) -> Subscription;

    async fn sign_in_with_password(
        &self,
        credentials: &PasswordCredentials,
    ) -> Result<Session, AuthError>;

    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpResponse, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    async fn refresh_session(&self) -> Result<Session, AuthError>;
}
