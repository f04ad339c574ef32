use std::path::Path;

use figment::providers::{Data, Env, Format, Serialized, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::auth::AuthConfig;
use super::logging::LoggingConfig;
use super::storage::StorageConfig;
use crate::error::ConfigError;

/// Environment variable holding the identity provider base URL.
pub const URL_ENV_VAR: &str = "EXPO_PUBLIC_SUPABASE_URL";
/// Environment variable holding the anonymous (public) API key.
pub const ANON_KEY_ENV_VAR: &str = "EXPO_PUBLIC_SUPABASE_ANON_KEY";

/// Version assumed when the config file is absent or does not say.
const CURRENT_VERSION: &str = "1.0.0";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    #[serde(default)]
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the hosted auth service lives. Both values may come from the
/// config file or from the `EXPO_PUBLIC_*` environment variables.
#[derive(Deserialize, Serialize, Debug, Clone, Default, JsonSchema)]
pub struct SupabaseConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

/// Credentials that passed validation; neither field is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub url: String,
    pub anon_key: String,
}

impl SupabaseConfig {
    /// Checks that both values are present, naming every missing one otherwise.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().map(str::trim).filter(|v| !v.is_empty())
        }

        let url = present(&self.url);
        let anon_key = present(&self.anon_key);

        let mut missing = Vec::new();
        if url.is_none() {
            missing.push(format!("{URL_ENV_VAR} (or supabase.url in config.yaml)"));
        }
        if anon_key.is_none() {
            missing.push(format!(
                "{ANON_KEY_ENV_VAR} (or supabase.anon_key in config.yaml)"
            ));
        }

        match (url, anon_key) {
            (Some(url), Some(anon_key)) => Ok(Credentials {
                url: url.trim_end_matches('/').to_string(),
                anon_key: anon_key.to_string(),
            }),
            _ => Err(ConfigError::MissingCredentials(missing)),
        }
    }
}

/// Environment overrides for the two credentials, mapped onto `supabase.*`.
fn credential_env() -> Env {
    Env::raw()
        .only(&[URL_ENV_VAR, ANON_KEY_ENV_VAR])
        .map(|key| {
            if key == URL_ENV_VAR {
                "supabase.url".into()
            } else if key == ANON_KEY_ENV_VAR {
                "supabase.anon_key".into()
            } else {
                key.as_str().into()
            }
        })
}

/// Layers: version default, then `file`, then the credential env overrides.
/// A config file is optional; with none, every section takes its defaults.
fn extract(file: Data<Yaml>) -> Result<ConfigV1, ConfigError> {
    let config = Figment::from(Serialized::default("version", CURRENT_VERSION))
        .merge(file)
        .merge(credential_env())
        .extract::<Config>()
        .map_err(Box::new)?;
    match config {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// Load config from a YAML file, then apply environment overrides.
pub fn load_config_from(path: impl AsRef<Path>) -> Result<ConfigV1, ConfigError> {
    extract(Yaml::file(path.as_ref()))
}

/// Load config from a YAML string, then apply environment overrides.
pub fn load_config_str(yaml: &str) -> Result<ConfigV1, ConfigError> {
    extract(Yaml::string(yaml))
}

/// Load config from "config.yaml" in the current directory, if present.
pub fn load_config() -> Result<ConfigV1, ConfigError> {
    load_config_from("./config.yaml")
}

/// JSON schema for the configuration file.
pub fn schema_json() -> String {
    let schema = schema_for!(Config);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
