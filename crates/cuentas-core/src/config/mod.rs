mod defaults;


use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::CuentasError;
use defaults::*;

/// Top-level Cuentas configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cuentas: GeneralConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub humanizer: HumanizerConfig,
    #[serde(default)]
    pub confirmation: ConfirmationConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    /// Channel user key → backend user id. Unmapped keys are used verbatim.
    #[serde(default)]
    pub accounts: HashMap<String, String>,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Financial backend REST API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub base_url: String,
    /// Bearer token. Empty = read `CUENTAS_BACKEND_API_KEY`.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            api_key: String::new(),
            timeout_secs: default_backend_timeout(),
        }
    }
}

impl BackendConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_secret(&self.api_key, "CUENTAS_BACKEND_API_KEY")
    }
}

/// OpenAI-compatible intent classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    /// Empty = read `OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_classifier_model")]
    pub model: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            api_key: String::new(),
            model: default_classifier_model(),
        }
    }
}

impl ClassifierConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_secret(&self.api_key, "OPENAI_API_KEY")
    }
}

/// Optional reply humanizer (OpenAI-compatible).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HumanizerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    /// Empty = read `OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_classifier_model")]
    pub model: String,
    /// Replies shorter than this are sent as-is.
    #[serde(default = "default_humanizer_min_length")]
    pub min_length: usize,
}

impl Default for HumanizerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_openai_base_url(),
            api_key: String::new(),
            model: default_classifier_model(),
            min_length: default_humanizer_min_length(),
        }
    }
}

impl HumanizerConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_secret(&self.api_key, "OPENAI_API_KEY")
    }
}

/// Confirmation housekeeping. The threshold and window themselves are fixed,
/// see [`crate::limits`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationConfig {
    /// Seconds between sweeps of expired pending actions and idle windows. 0 = never.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// SQLite audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_audit_db_path")]
    pub db_path: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            db_path: default_audit_db_path(),
        }
    }
}

impl Config {
    /// Backend user id for a channel user key.
    pub fn backend_user_id<'a>(&'a self, user_key: &'a str) -> &'a str {
        self.accounts
            .get(user_key)
            .map(String::as_str)
            .unwrap_or(user_key)
    }
}

/// Use `configured` unless empty, then fall back to the env var.
fn resolve_secret(configured: &str, env_var: &str) -> Option<String> {
    if !configured.is_empty() {
        return Some(configured.to_string());
    }
    std::env::var(env_var).ok().filter(|v| !v.is_empty())
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, CuentasError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| CuentasError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    parse(&content)
}

/// Parse configuration from TOML text.
pub fn parse(content: &str) -> Result<Config, CuentasError> {
    toml::from_str(content).map_err(|e| CuentasError::Config(format!("failed to parse config: {e}")))
}
