//! Configuration loading and management

use anyhow::{Context, Result};
use fastly_tls_adapters::api::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory holding the resource state file
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// `fastly` or `memory`
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("./.fastly-tls")
}

fn default_provider() -> String {
    "fastly".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_key_env() -> String {
    "FASTLY_API_KEY".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            state_dir: default_state_dir(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./fastly-tls.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        builder = builder.add_source(
            config::Environment::with_prefix("FASTLY_TLS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Log level from the file and environment, or the default when the
    /// configuration cannot be loaded
    pub fn configured_log_level(config_path: Option<&Path>) -> String {
        Self::load(config_path)
            .map(|config| config.general.log_level)
            .unwrap_or_else(|_| default_log_level())
    }

    /// State file used when no `--state` override is given
    pub fn default_state_path(&self) -> PathBuf {
        self.general.state_dir.join("subscription.json")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        format!(
            r#"# fastly-tls configuration

[general]
log_level = "info"
state_dir = "./.fastly-tls"

[api]
provider = "fastly"  # fastly, memory
base_url = "{DEFAULT_BASE_URL}"
api_key_env = "FASTLY_API_KEY"
timeout_secs = 30
"#
        )
    }
}
