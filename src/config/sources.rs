// Configuration source loading.
//
// Priority order:
// 1. Environment variables (LAMBDACTL_* prefix)
// 2. Config file path from LAMBDACTL_CONFIG
// 3. Default config files (./lambdactl.toml, ./.lambdactl.toml)
// 4. Built-in defaults

use super::env_overrides::{self, EnvSource, ENV_PREFIX};
use super::LambdactlConfig;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

const DEFAULT_PATHS: &[&str] = &["./lambdactl.toml", "./.lambdactl.toml"];

fn load_from_file() -> Result<Option<LambdactlConfig>> {
    if let Ok(path) = env::var("LAMBDACTL_CONFIG") {
        return read_config_file(Path::new(&path)).map(Some);
    }

    for path in DEFAULT_PATHS {
        let path = Path::new(path);
        if path.exists() {
            return read_config_file(path).map(Some);
        }
    }

    Ok(None)
}

fn read_config_file(path: &Path) -> Result<LambdactlConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns error if file doesn't exist or can't be parsed.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<LambdactlConfig> {
    let file_config = read_config_file(path.as_ref())?;

    let mut config = LambdactlConfig::default();
    config.merge(file_config);

    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;

    config.validate()?;
    Ok(config)
}

/// Load configuration with graceful fallback to defaults.
/// A default-location file that exists but fails to parse is still an error.
pub fn load_or_default() -> Result<LambdactlConfig> {
    let mut config = LambdactlConfig::default();

    if let Some(file_config) = load_from_file()? {
        config.merge(file_config);
    }

    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;

    config.validate()?;
    Ok(config)
}

struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}
