//! Apply engine: submit plan items one at a time and poll each to a terminal
//! state.

use super::plan::{UpgradePlan, UpgradePlanItem};
use super::Presenter;
use crate::cloud::{CloudApi, UpdateStatus};
use crate::config::UpgradeConfig;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Poll timing for a single item
#[derive(Debug, Clone, PartialEq)]
pub struct PollSettings {
    pub timeout: Duration,
    pub base_interval: Duration,
    pub max_interval: Duration,
    pub backoff_factor: f64,
}

impl PollSettings {
    fn next_interval(&self, current: Duration) -> Duration {
        current.mul_f64(self.backoff_factor).min(self.max_interval)
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::from(&UpgradeConfig::default())
    }
}

impl From<&UpgradeConfig> for PollSettings {
    fn from(config: &UpgradeConfig) -> Self {
        Self {
            timeout: config.poll_timeout(),
            base_interval: config.poll_base_interval(),
            max_interval: config.poll_max_interval(),
            backoff_factor: config.poll_backoff_factor,
        }
    }
}

/// Terminal outcome of one attempted item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpgradeStatus {
    Successful,
    Failed,
    /// No terminal remote status observed in time; the remote update may
    /// still be running
    Timeout,
}

impl fmt::Display for UpgradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpgradeStatus::Successful => write!(f, "successful"),
            UpgradeStatus::Failed => write!(f, "failed"),
            UpgradeStatus::Timeout => write!(f, "timeout"),
        }
    }
}

/// Per-item lifecycle: Pending → Submitted → Polling → Finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Pending,
    Submitted,
    Polling,
    Finished(UpgradeStatus),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeResult {
    pub name: String,
    pub status: UpgradeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl UpgradeResult {
    fn new(name: &str, status: UpgradeStatus, reason: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            reason,
        }
    }
}

/// Execute items strictly in order; one result per item, always.
pub async fn apply_plan(
    api: &dyn CloudApi,
    items: &[UpgradePlanItem],
    settings: &PollSettings,
    presenter: &mut dyn Presenter,
) -> Vec<UpgradeResult> {
    for item in items {
        presenter.item_state(&item.name, ItemState::Pending);
    }

    let mut results = Vec::with_capacity(items.len());
    for item in items {
        let result = apply_item(api, item, settings, presenter).await;
        presenter.item_state(&item.name, ItemState::Finished(result.status));
        results.push(result);
    }
    results
}

async fn apply_item(
    api: &dyn CloudApi,
    item: &UpgradePlanItem,
    settings: &PollSettings,
    presenter: &mut dyn Presenter,
) -> UpgradeResult {
    let update = item.configuration_update();
    info!(
        function = %item.name,
        runtime = ?update.runtime,
        layers = ?update.layers,
        "Submitting configuration update"
    );

    // Submission is never retried
    if let Err(e) = api.update_function_configuration(&item.name, &update).await {
        warn!(function = %item.name, error = %e, "Configuration update rejected");
        return UpgradeResult::new(&item.name, UpgradeStatus::Failed, Some(e.to_string()));
    }
    presenter.item_state(&item.name, ItemState::Submitted);

    presenter.item_state(&item.name, ItemState::Polling);
    let started = Instant::now();
    let mut interval = settings.base_interval;

    loop {
        match api.get_function_configuration(&item.name).await {
            Ok(state) => match state.last_update_status {
                Some(UpdateStatus::Successful) => {
                    info!(function = %item.name, "Update successful");
                    return UpgradeResult::new(&item.name, UpgradeStatus::Successful, None);
                }
                Some(UpdateStatus::Failed) => {
                    let reason = state
                        .last_update_status_reason
                        .unwrap_or_else(|| "update failed without a reason".to_string());
                    warn!(function = %item.name, reason = %reason, "Update failed");
                    return UpgradeResult::new(&item.name, UpgradeStatus::Failed, Some(reason));
                }
                Some(UpdateStatus::InProgress) | None => {
                    debug!(function = %item.name, "Update still in progress");
                }
            },
            // Status reads are retried until the deadline
            Err(e) => warn!(function = %item.name, error = %e, "Status poll failed"),
        }

        let elapsed = started.elapsed();
        if elapsed >= settings.timeout {
            warn!(
                function = %item.name,
                elapsed_secs = elapsed.as_secs(),
                "Gave up waiting for update status"
            );
            return UpgradeResult::new(
                &item.name,
                UpgradeStatus::Timeout,
                Some(format!(
                    "no terminal update status after {}s",
                    elapsed.as_secs()
                )),
            );
        }

        tokio::time::sleep(interval.min(settings.timeout - elapsed)).await;
        interval = settings.next_interval(interval);
    }
}

/// Final accounting of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeSummary {
    pub target_runtime: String,
    pub successful: usize,
    /// Failed and timed-out items together
    pub failed: usize,
    /// Selected items already on the desired state
    pub skipped: usize,
    pub not_found: Vec<String>,
    /// Every non-successful item with its reason
    pub failures: Vec<UpgradeResult>,
    pub results: Vec<UpgradeResult>,
}

impl UpgradeSummary {
    pub fn new(plan: &UpgradePlan, results: Vec<UpgradeResult>) -> Self {
        let failures: Vec<UpgradeResult> = results
            .iter()
            .filter(|r| r.status != UpgradeStatus::Successful)
            .cloned()
            .collect();

        Self {
            target_runtime: plan.target_runtime.clone(),
            successful: results.len() - failures.len(),
            failed: failures.len(),
            skipped: plan.already_satisfied.len(),
            not_found: plan.not_found.clone(),
            failures,
            results,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let settings = PollSettings {
            timeout: Duration::from_secs(60),
            base_interval: Duration::from_millis(1_000),
            max_interval: Duration::from_millis(3_000),
            backoff_factor: 1.5,
        };
        let second = settings.next_interval(settings.base_interval);
        assert_eq!(second, Duration::from_millis(1_500));
        let third = settings.next_interval(second);
        assert_eq!(third, Duration::from_millis(2_250));
        let fourth = settings.next_interval(third);
        assert_eq!(fourth, Duration::from_millis(3_000));
        assert_eq!(settings.next_interval(fourth), Duration::from_millis(3_000));
    }

    #[test]
    fn test_default_settings() {
        let settings = PollSettings::default();
        assert_eq!(settings.timeout, Duration::from_secs(60));
        assert_eq!(settings.backoff_factor, 1.5);
        assert!(settings.base_interval < settings.max_interval);
    }

    #[test]
    fn test_summary_counts() {
        let plan = UpgradePlan {
            target_runtime: "nodejs20.x".to_string(),
            to_upgrade: vec![],
            already_satisfied: vec![],
            not_found: vec!["ghost".to_string()],
        };
        let results = vec![
            UpgradeResult::new("a", UpgradeStatus::Successful, None),
            UpgradeResult::new("b", UpgradeStatus::Failed, Some("denied".to_string())),
            UpgradeResult::new("c", UpgradeStatus::Timeout, Some("60s".to_string())),
        ];
        let summary = UpgradeSummary::new(&plan, results);
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.skipped, 0);
        assert!(summary.has_failures());
        let failed: Vec<_> = summary.failures.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(failed, vec!["b", "c"]);
        assert_eq!(summary.not_found, vec!["ghost".to_string()]);
    }
}
