//! Inventory collection: the current fleet of candidate functions.

use super::runtime::{derive_family, RuntimeFamily};
use crate::cloud::CloudApi;
use crate::error::{Result, UpgradeError};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

/// Last observed activity of a function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "at")]
pub enum LastInvocation {
    At(DateTime<Utc>),
    /// No log group, stream or event exists
    Never,
    /// The lookup itself failed
    Unknown,
}

impl LastInvocation {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            LastInvocation::At(ts) => Some(*ts),
            LastInvocation::Never | LastInvocation::Unknown => None,
        }
    }
}

impl fmt::Display for LastInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LastInvocation::At(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M UTC")),
            LastInvocation::Never => write!(f, "never invoked"),
            LastInvocation::Unknown => write!(f, "unknown"),
        }
    }
}

/// Snapshot of one remote function, built fresh on every run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionRecord {
    pub name: String,
    pub runtime: String,
    pub layers: Vec<String>,
    pub last_invocation: LastInvocation,
}

impl FunctionRecord {
    /// Composite label used by the interactive picker
    pub fn label(&self) -> String {
        let layers = if self.layers.is_empty() {
            "no layers".to_string()
        } else {
            self.layers.join(", ")
        };
        format!(
            "{} | last invoked: {} | {} | {}",
            self.name, self.last_invocation, self.runtime, layers
        )
    }
}

/// Result of inventory collection for one target family
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub family: RuntimeFamily,
    /// Functions in the target family, most recently invoked first
    pub candidates: Vec<FunctionRecord>,
    /// Functions listed in total, candidates included
    pub total_functions: usize,
}

/// Query the fleet, keep the target family, and enrich with last activity.
///
/// A failed listing is fatal; a failed per-function lookup only degrades that
/// function to [`LastInvocation::Unknown`].
pub async fn collect(api: &dyn CloudApi, family: RuntimeFamily) -> Result<Inventory> {
    let functions = api
        .list_functions()
        .await
        .map_err(|e| UpgradeError::from_listing("functions", e))?;
    let total_functions = functions.len();

    let mut candidates: Vec<FunctionRecord> = functions
        .into_iter()
        .filter_map(|function| {
            let runtime = function.runtime?;
            (derive_family(&runtime) == family).then(|| FunctionRecord {
                name: function.name,
                runtime,
                layers: function.layers,
                last_invocation: LastInvocation::Unknown,
            })
        })
        .collect();

    info!(
        total = total_functions,
        candidates = candidates.len(),
        family = %family,
        "Collected function inventory"
    );

    let activity = lookup_last_invocations(api, &candidates).await;
    for record in &mut candidates {
        record.last_invocation = activity
            .get(&record.name)
            .copied()
            .unwrap_or(LastInvocation::Unknown);
    }

    // Stable: equal timestamps keep listing order. `None` sorts below any
    // timestamp, so reversing the comparison puts missing activity last.
    candidates.sort_by(|a, b| {
        b.last_invocation
            .timestamp()
            .cmp(&a.last_invocation.timestamp())
    });

    Ok(Inventory {
        family,
        candidates,
        total_functions,
    })
}

/// Concurrent lookups joined by name. Every lookup settles into a value, so
/// one failing log query cannot fail the join.
async fn lookup_last_invocations(
    api: &dyn CloudApi,
    records: &[FunctionRecord],
) -> HashMap<String, LastInvocation> {
    let lookups = records.iter().map(|record| {
        let name = record.name.clone();
        async move {
            let activity = match api.last_invocation(&name).await {
                Ok(Some(ts)) => LastInvocation::At(ts),
                Ok(None) => LastInvocation::Never,
                Err(e) => {
                    warn!(function = %name, error = %e, "Last invocation lookup failed");
                    LastInvocation::Unknown
                }
            };
            (name, activity)
        }
    });

    let settled: HashMap<String, LastInvocation> = join_all(lookups).await.into_iter().collect();
    debug!(lookups = settled.len(), "Last invocation lookups settled");
    settled
}
