use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where the session is written when no backend is configured.
pub const DEFAULT_SESSION_PATH: &str = ".felonyfit/session.json";

/// A wrapper for the session storage configuration:
/// - enabled: if false, sessions live in memory only (NoStorage).
/// - backend: where persisted sessions are written; a file at
///   [`DEFAULT_SESSION_PATH`] when unset.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct StorageConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(flatten)]
    pub backend: Option<StorageBackend>,
}

fn default_enabled() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            backend: None,
        }
    }
}

/// The available storage backends, selected by a "type" tag in the YAML.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(tag = "type")]
pub enum StorageBackend {
    #[serde(rename = "file")]
    File(FileStorageConfig),
}

/// Persist the session as a JSON document at `path`.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct FileStorageConfig {
    pub path: String,
}
