// lambdactl configuration
//
// Supports configuration from multiple sources:
// 1. Command-line flags (applied by the binary, highest priority)
// 2. Environment variables (LAMBDACTL_* prefix)
// 3. Config file path from --config or LAMBDACTL_CONFIG
// 4. Default config file locations (./lambdactl.toml, ./.lambdactl.toml)
// 5. Built-in defaults (lowest priority)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{EnvSource, ENV_PREFIX};

/// Main CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LambdactlConfig {
    #[serde(default)]
    pub aws: AwsConfig,

    #[serde(default)]
    pub upgrade: UpgradeConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Environment targeting for the AWS SDK. Unset values fall back to the
/// SDK's own resolution chain (AWS_PROFILE, AWS_REGION, shared config).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Apply engine polling behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeConfig {
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    #[serde(default = "default_poll_base_interval_ms")]
    pub poll_base_interval_ms: u64,
    #[serde(default = "default_poll_max_interval_ms")]
    pub poll_max_interval_ms: u64,
    #[serde(default = "default_poll_backoff_factor")]
    pub poll_backoff_factor: f64,
}

fn default_poll_timeout_secs() -> u64 {
    60
}

fn default_poll_base_interval_ms() -> u64 {
    1_000
}

fn default_poll_max_interval_ms() -> u64 {
    8_000
}

fn default_poll_backoff_factor() -> f64 {
    1.5
}

impl UpgradeConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn poll_base_interval(&self) -> Duration {
        Duration::from_millis(self.poll_base_interval_ms)
    }

    pub fn poll_max_interval(&self) -> Duration {
        Duration::from_millis(self.poll_max_interval_ms)
    }
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            poll_timeout_secs: default_poll_timeout_secs(),
            poll_base_interval_ms: default_poll_base_interval_ms(),
            poll_max_interval_ms: default_poll_max_interval_ms(),
            poll_backoff_factor: default_poll_backoff_factor(),
        }
    }
}

/// Diagnostic logging (stderr). User-facing output never goes through here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

impl LambdactlConfig {
    /// Load configuration from a specific file path (for the --config flag).
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Load configuration with graceful fallback to defaults.
    /// Does not fail if no config file exists.
    pub fn load_or_default() -> Result<Self> {
        sources::load_or_default()
    }

    /// Merge a file-provided config into this one. Absent AWS targeting in the
    /// file keeps whatever was set before.
    pub fn merge(&mut self, other: LambdactlConfig) {
        if other.aws.profile.is_some() {
            self.aws.profile = other.aws.profile;
        }
        if other.aws.region.is_some() {
            self.aws.region = other.aws.region;
        }
        self.upgrade = other.upgrade;
        self.log = other.log;
    }

    /// Apply environment overrides from a custom source.
    pub fn apply_env_overrides_from<E: EnvSource>(&mut self, env: &E) -> Result<()> {
        env_overrides::apply_env_overrides(self, env)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}
