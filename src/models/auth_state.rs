use super::session::Session;
use super::user::User;

/// The session/user/loading triad shared with the rest of the client.
///
/// Fields are private so the two invariants hold by construction:
/// `user` is always the user embedded in `session`, and once a state has
/// been resolved there is no way back to `loading`.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthState {
    session: Option<Session>,
    user: Option<User>,
    loading: bool,
}

impl AuthState {
    /// The state before the initial session check has resolved.
    pub fn loading() -> Self {
        AuthState {
            session: None,
            user: None,
            loading: true,
        }
    }

    /// A settled state derived from the provider's session.
    pub fn resolved(session: Option<Session>) -> Self {
        let user = session.as_ref().map(|s| s.user.clone());
        AuthState {
            session,
            user,
            loading: false,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_authenticated(&self) -> bool {
        !self.loading && self.user.is_some()
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::loading()
    }
}
