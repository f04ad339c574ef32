//! Error types shared across the client.

use thiserror::Error;

/// Errors raised while talking to the identity provider or reading auth state.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider answered with an error payload. `message` is the provider's
    /// own wording and is shown to the user as-is.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The request never produced a usable HTTP response.
    #[error("request to identity provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered 2xx but the body did not have the expected shape.
    #[error("unexpected response from identity provider: {0}")]
    Decode(String),

    #[error("session storage error: {0}")]
    Storage(String),

    /// Auth state was read through a handle whose session store has been torn down.
    #[error("auth state accessed outside of an active session store")]
    ContextUnavailable,
}

impl AuthError {
    /// True for errors the provider reported about the request itself
    /// (bad credentials, duplicate account, expired refresh token...).
    pub fn is_api(&self) -> bool {
        matches!(self, AuthError::Api { .. })
    }

    /// True when the provider rejected the request with a 4xx status.
    pub fn is_client_rejection(&self) -> bool {
        matches!(self, AuthError::Api { status, .. } if (400..500).contains(status))
    }
}

/// Errors raised while loading configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error loading configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error(
        "Missing required Supabase credentials: {}. Please check your environment configuration.",
        .0.join(", ")
    )]
    MissingCredentials(Vec<String>),

    #[error("Invalid logging.level '{0}'. Valid values: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Failed to initialise logging: {0}")]
    Logging(String),
}
