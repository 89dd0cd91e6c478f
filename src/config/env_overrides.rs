use super::{LambdactlConfig, LogFormat};
use anyhow::{anyhow, Context, Result};

pub const ENV_PREFIX: &str = "LAMBDACTL_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the LAMBDACTL_ prefix
    /// Used for AWS standard variables (AWS_PROFILE, AWS_REGION)
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides to the config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut LambdactlConfig, env: &E) -> Result<()> {
    // AWS targeting. Prefixed variables win over the SDK-standard ones.
    if let Some(profile) = get_env_string(env, "PROFILE")? {
        config.aws.profile = Some(profile);
    } else if let Some(profile) = get_raw_env_string(env, "AWS_PROFILE")? {
        config.aws.profile.get_or_insert(profile);
    }
    if let Some(region) = get_env_string(env, "REGION")? {
        config.aws.region = Some(region);
    } else if let Some(region) = get_raw_env_string(env, "AWS_REGION")? {
        config.aws.region.get_or_insert(region);
    }

    // Polling
    if let Some(val) = get_env_u64(env, "POLL_TIMEOUT_SECS")? {
        config.upgrade.poll_timeout_secs = val;
    }
    if let Some(val) = get_env_u64(env, "POLL_BASE_INTERVAL_MS")? {
        config.upgrade.poll_base_interval_ms = val;
    }
    if let Some(val) = get_env_u64(env, "POLL_MAX_INTERVAL_MS")? {
        config.upgrade.poll_max_interval_ms = val;
    }
    if let Some(val) = get_env_f64(env, "POLL_BACKOFF_FACTOR")? {
        config.upgrade.poll_backoff_factor = val;
    }

    // Logging
    if let Some(level) = get_env_string(env, "LOG_LEVEL")? {
        config.log.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT")? {
        config.log.format = format
            .parse::<LogFormat>()
            .context("Invalid LAMBDACTL_LOG_FORMAT value")?;
    }

    Ok(())
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Result<Option<String>> {
    Ok(env.get(key).filter(|v| !v.is_empty()))
}

fn get_raw_env_string<E: EnvSource>(env: &E, key: &str) -> Result<Option<String>> {
    Ok(env.get_raw(key).filter(|v| !v.is_empty()))
}

fn get_env_u64<E: EnvSource>(env: &E, key: &str) -> Result<Option<u64>> {
    match get_env_string(env, key)? {
        Some(val) => {
            let parsed = val
                .parse::<u64>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_env_f64<E: EnvSource>(env: &E, key: &str) -> Result<Option<f64>> {
    match get_env_string(env, key)? {
        Some(val) => {
            let parsed = val
                .parse::<f64>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}
