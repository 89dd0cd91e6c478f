//! Cloud resource API seam.
//!
//! Everything the CLI needs from AWS goes through [`CloudApi`] so the upgrade
//! flow can be driven by an in-memory fake in tests.

mod aws;

use crate::error::CloudError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub use aws::AwsCloud;

/// One function as reported by the bulk listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionSummary {
    pub name: String,
    /// `None` for container-image functions
    pub runtime: Option<String>,
    pub layers: Vec<String>,
}

/// Remote update status of a function configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    Successful,
    Failed,
    InProgress,
}

impl UpdateStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UpdateStatus::Successful | UpdateStatus::Failed)
    }
}

/// Live configuration of one function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionState {
    pub runtime: Option<String>,
    pub layers: Vec<String>,
    pub last_update_status: Option<UpdateStatus>,
    pub last_update_status_reason: Option<String>,
}

/// Changes sent in a single configuration update call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationUpdate {
    pub runtime: Option<String>,
    /// Replaces the full layer list when present
    pub layers: Option<Vec<String>>,
}

/// One layer with its newest version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerSummary {
    pub name: String,
    pub latest_version_arn: Option<String>,
    pub description: Option<String>,
    pub compatible_runtimes: Vec<String>,
}

impl LayerSummary {
    /// Version number parsed from the trailing segment of the version ARN
    pub fn latest_version(&self) -> Option<u64> {
        self.latest_version_arn
            .as_deref()
            .and_then(|arn| arn.rsplit(':').next())
            .and_then(|v| v.parse().ok())
    }
}

#[async_trait]
pub trait CloudApi: Send + Sync {
    /// List every function in the account/region (all pages).
    async fn list_functions(&self) -> Result<Vec<FunctionSummary>, CloudError>;

    async fn get_function_configuration(&self, name: &str) -> Result<FunctionState, CloudError>;

    /// Submit a configuration change. Returns once the API accepted it; the
    /// change itself completes asynchronously.
    async fn update_function_configuration(
        &self,
        name: &str,
        update: &ConfigurationUpdate,
    ) -> Result<(), CloudError>;

    /// Timestamp of the newest log event of the function's log group.
    /// `Ok(None)` when the group, its streams or its events do not exist.
    async fn last_invocation(&self, name: &str) -> Result<Option<DateTime<Utc>>, CloudError>;

    async fn list_layers(&self) -> Result<Vec<LayerSummary>, CloudError>;
}
