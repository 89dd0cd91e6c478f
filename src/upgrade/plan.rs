//! Selection and plan building: reduce candidates to a minimal change plan.

use super::inventory::FunctionRecord;
use crate::cloud::ConfigurationUpdate;
use crate::prompt::Operator;
use anyhow::Result;
use serde::Serialize;
use tracing::debug;

/// How functions are picked from the candidate set, in precedence order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Exact names; names outside the candidate set are reported as not found
    Include(Vec<String>),
    All,
    Interactive,
}

impl Selection {
    /// Resolve CLI flags. An explicit list wins over `--all`.
    pub fn from_flags(include: Vec<String>, all: bool) -> Self {
        if !include.is_empty() {
            Selection::Include(include)
        } else if all {
            Selection::All
        } else {
            Selection::Interactive
        }
    }
}

/// Candidates picked for planning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selected {
    pub records: Vec<FunctionRecord>,
    /// Requested names that are not candidates
    pub not_found: Vec<String>,
}

/// Apply the selection mode. `Ok(None)` means the operator cancelled.
pub fn select(
    candidates: &[FunctionRecord],
    selection: &Selection,
    operator: &dyn Operator,
) -> Result<Option<Selected>> {
    match selection {
        Selection::Include(names) => {
            // Keep candidate order (most recently invoked first)
            let records = candidates
                .iter()
                .filter(|c| names.iter().any(|n| n == &c.name))
                .cloned()
                .collect();
            let mut not_found: Vec<String> = Vec::new();
            for name in names {
                if !candidates.iter().any(|c| &c.name == name) && !not_found.contains(name) {
                    not_found.push(name.clone());
                }
            }
            Ok(Some(Selected { records, not_found }))
        }
        Selection::All => Ok(Some(Selected {
            records: candidates.to_vec(),
            not_found: Vec::new(),
        })),
        Selection::Interactive => {
            if candidates.is_empty() {
                return Ok(Some(Selected {
                    records: Vec::new(),
                    not_found: Vec::new(),
                }));
            }
            let labels: Vec<String> = candidates.iter().map(FunctionRecord::label).collect();
            let Some(chosen) = operator.select("Select functions to upgrade", &labels)? else {
                return Ok(None);
            };
            let mut chosen = chosen;
            chosen.sort_unstable();
            chosen.dedup();
            let records = chosen
                .into_iter()
                .filter_map(|i| candidates.get(i).cloned())
                .collect();
            Ok(Some(Selected {
                records,
                not_found: Vec::new(),
            }))
        }
    }
}

/// Per-function diff between current and desired state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradePlanItem {
    pub name: String,
    pub from_runtime: String,
    pub to_runtime: String,
    pub from_layers: Vec<String>,
    /// Present only when a layer replacement was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_layers: Option<Vec<String>>,
    pub change_runtime: bool,
    pub change_layers: bool,
}

impl UpgradePlanItem {
    pub fn needs_change(&self) -> bool {
        self.change_runtime || self.change_layers
    }

    /// The single update call for this item
    pub fn configuration_update(&self) -> ConfigurationUpdate {
        ConfigurationUpdate {
            runtime: self.change_runtime.then(|| self.to_runtime.clone()),
            layers: if self.change_layers {
                self.to_layers.clone()
            } else {
                None
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradePlan {
    pub target_runtime: String,
    /// Executable items, in candidate order
    pub to_upgrade: Vec<UpgradePlanItem>,
    /// Selected items already matching the desired state; never submitted
    pub already_satisfied: Vec<UpgradePlanItem>,
    pub not_found: Vec<String>,
}

impl UpgradePlan {
    pub fn is_empty(&self) -> bool {
        self.to_upgrade.is_empty()
    }
}

/// Diff every selected record against the desired runtime and layers.
///
/// Layer replacement is a full replace: the desired list is compared
/// order-sensitively with the current one.
pub fn build_plan(
    selected: &Selected,
    target_runtime: &str,
    desired_layers: Option<&[String]>,
) -> UpgradePlan {
    let (to_upgrade, already_satisfied): (Vec<_>, Vec<_>) = selected
        .records
        .iter()
        .map(|record| plan_item(record, target_runtime, desired_layers))
        .partition(UpgradePlanItem::needs_change);

    debug!(
        to_upgrade = to_upgrade.len(),
        already_satisfied = already_satisfied.len(),
        not_found = selected.not_found.len(),
        "Built upgrade plan"
    );

    UpgradePlan {
        target_runtime: target_runtime.to_string(),
        to_upgrade,
        already_satisfied,
        not_found: selected.not_found.clone(),
    }
}

fn plan_item(
    record: &FunctionRecord,
    target_runtime: &str,
    desired_layers: Option<&[String]>,
) -> UpgradePlanItem {
    let change_runtime = !record.runtime.eq_ignore_ascii_case(target_runtime);
    let change_layers = desired_layers.is_some_and(|desired| record.layers.as_slice() != desired);

    UpgradePlanItem {
        name: record.name.clone(),
        from_runtime: record.runtime.clone(),
        to_runtime: target_runtime.to_string(),
        from_layers: record.layers.clone(),
        to_layers: desired_layers.map(<[String]>::to_vec),
        change_runtime,
        change_layers,
    }
}
