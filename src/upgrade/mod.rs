//! Runtime upgrade orchestrator.
//!
//! Stages run strictly forward:
//! validate target → collect inventory → select & plan → confirm → apply.
//! The orchestrator only returns structured values; rendering happens in a
//! [`Presenter`].

pub mod apply;
pub mod inventory;
pub mod plan;
pub mod runtime;

use crate::cloud::CloudApi;
use crate::prompt::Operator;
use anyhow::Result;
use std::fmt;
use tracing::debug;

pub use apply::{ItemState, PollSettings, UpgradeResult, UpgradeStatus, UpgradeSummary};
pub use inventory::{FunctionRecord, Inventory, LastInvocation};
pub use plan::{Selection, UpgradePlan, UpgradePlanItem};
pub use runtime::{derive_family, validate_target, RuntimeFamily};

/// Where the orchestrator currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Collecting,
    Planning,
    Confirming,
    Applying,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Collecting => "collecting",
            Phase::Planning => "planning",
            Phase::Confirming => "confirming",
            Phase::Applying => "applying",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Rendering hooks. All methods default to doing nothing.
pub trait Presenter {
    fn phase_changed(&mut self, _phase: Phase) {}
    fn inventory(&mut self, _inventory: &Inventory) {}
    fn plan(&mut self, _plan: &UpgradePlan) {}
    fn item_state(&mut self, _name: &str, _state: ItemState) {}
    fn summary(&mut self, _summary: &UpgradeSummary) {}
}

/// Presenter that renders nothing
pub struct NoopPresenter;

impl Presenter for NoopPresenter {}

/// Inputs of one upgrade run
#[derive(Debug, Clone)]
pub struct UpgradeRequest {
    pub target_runtime: String,
    pub selection: Selection,
    /// Replaces the whole layer list with this single ARN
    pub layer: Option<String>,
    pub assume_yes: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradeOutcome {
    /// Operator cancelled or declined; nothing was changed
    Cancelled,
    /// Every selected function already matches the desired state
    NothingToDo(UpgradePlan),
    DryRun(UpgradePlan),
    Applied {
        plan: UpgradePlan,
        summary: UpgradeSummary,
    },
}

impl UpgradeOutcome {
    /// Summary for reporting; empty for runs that changed nothing
    pub fn summary(&self) -> Option<UpgradeSummary> {
        match self {
            UpgradeOutcome::Cancelled => None,
            UpgradeOutcome::NothingToDo(plan) | UpgradeOutcome::DryRun(plan) => {
                Some(UpgradeSummary::new(plan, Vec::new()))
            }
            UpgradeOutcome::Applied { summary, .. } => Some(summary.clone()),
        }
    }
}

pub struct Orchestrator<'a> {
    api: &'a dyn CloudApi,
    poll: PollSettings,
    phase: Phase,
}

impl<'a> Orchestrator<'a> {
    pub fn new(api: &'a dyn CloudApi, poll: PollSettings) -> Self {
        Self {
            api,
            poll,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn enter(&mut self, phase: Phase, presenter: &mut dyn Presenter) {
        debug!(from = %self.phase, to = %phase, "Upgrade phase change");
        self.phase = phase;
        presenter.phase_changed(phase);
    }

    /// Run the whole upgrade flow.
    ///
    /// Validation, authorization and listing failures are returned as errors
    /// (an [`crate::error::UpgradeError`] inside the `anyhow::Error`). Per-item
    /// failures never are: they end up in the summary.
    pub async fn run(
        &mut self,
        request: &UpgradeRequest,
        operator: &dyn Operator,
        presenter: &mut dyn Presenter,
    ) -> Result<UpgradeOutcome> {
        // Before any network call
        let family = validate_target(&request.target_runtime)?;

        self.enter(Phase::Collecting, presenter);
        let inventory = inventory::collect(self.api, family).await?;
        presenter.inventory(&inventory);

        self.enter(Phase::Planning, presenter);
        let Some(selected) = plan::select(&inventory.candidates, &request.selection, operator)?
        else {
            self.enter(Phase::Done, presenter);
            return Ok(UpgradeOutcome::Cancelled);
        };
        let desired_layers = request.layer.clone().map(|arn| vec![arn]);
        let plan = plan::build_plan(
            &selected,
            &request.target_runtime,
            desired_layers.as_deref(),
        );
        presenter.plan(&plan);

        if plan.is_empty() {
            self.enter(Phase::Done, presenter);
            return Ok(UpgradeOutcome::NothingToDo(plan));
        }
        if request.dry_run {
            self.enter(Phase::Done, presenter);
            return Ok(UpgradeOutcome::DryRun(plan));
        }

        if !request.assume_yes {
            self.enter(Phase::Confirming, presenter);
            let prompt = format!(
                "Upgrade {} function(s) to {}?",
                plan.to_upgrade.len(),
                plan.target_runtime
            );
            if operator.confirm(&prompt)? != Some(true) {
                self.enter(Phase::Done, presenter);
                return Ok(UpgradeOutcome::Cancelled);
            }
        }

        self.enter(Phase::Applying, presenter);
        let results = apply::apply_plan(self.api, &plan.to_upgrade, &self.poll, presenter).await;
        let summary = UpgradeSummary::new(&plan, results);
        presenter.summary(&summary);

        self.enter(Phase::Done, presenter);
        Ok(UpgradeOutcome::Applied { plan, summary })
    }
}
