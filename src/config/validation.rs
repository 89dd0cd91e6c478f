// Configuration validation
//
// Validates that polling values are sensible before any AWS call is made

use super::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &LambdactlConfig) -> Result<()> {
    validate_upgrade_config(&config.upgrade)?;
    validate_aws_config(&config.aws)?;
    Ok(())
}

fn validate_upgrade_config(config: &UpgradeConfig) -> Result<()> {
    if config.poll_timeout_secs == 0 {
        bail!(
            "upgrade.poll_timeout_secs must be greater than 0\n\n\
            How to fix:\n\
              • Environment: export {}POLL_TIMEOUT_SECS=60\n\
              • TOML: [upgrade]\n              poll_timeout_secs = 60",
            ENV_PREFIX
        );
    }

    if config.poll_base_interval_ms == 0 {
        bail!("upgrade.poll_base_interval_ms must be greater than 0");
    }

    if config.poll_max_interval_ms < config.poll_base_interval_ms {
        bail!(
            "upgrade.poll_max_interval_ms ({}) must not be smaller than upgrade.poll_base_interval_ms ({})",
            config.poll_max_interval_ms,
            config.poll_base_interval_ms
        );
    }

    if !config.poll_backoff_factor.is_finite() || config.poll_backoff_factor < 1.0 {
        bail!(
            "upgrade.poll_backoff_factor must be a finite number >= 1.0 (got {})",
            config.poll_backoff_factor
        );
    }

    // Lambda updates usually settle within a minute; very long waits are
    // probably a typo in seconds vs. milliseconds.
    if config.poll_timeout_secs > 15 * 60 {
        warn!(
            poll_timeout_secs = config.poll_timeout_secs,
            "upgrade.poll_timeout_secs is very large"
        );
    }

    Ok(())
}

fn validate_aws_config(config: &AwsConfig) -> Result<()> {
    if let Some(region) = &config.region {
        if region.trim().is_empty() || region.contains(char::is_whitespace) {
            bail!("aws.region '{}' is not a valid region name", region);
        }
    }
    Ok(())
}
