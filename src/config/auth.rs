use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Client-side session behaviour, mirroring the hosted SDK's auth options.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct AuthConfig {
    /// Refresh the access token in the background before it expires.
    pub auto_refresh_token: bool,
    /// Write sessions to the configured storage so they survive restarts.
    pub persist_session: bool,
    /// Seconds between auto-refresh checks.
    pub refresh_tick_secs: u64,
    /// Refresh once the session expires within this many seconds.
    pub expiry_margin_secs: i64,
    /// Per-request timeout. No timeout when unset.
    pub request_timeout_ms: Option<u64>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            auto_refresh_token: true,
            persist_session: true,
            refresh_tick_secs: 30,
            expiry_margin_secs: 90,
            request_timeout_ms: None,
        }
    }
}
