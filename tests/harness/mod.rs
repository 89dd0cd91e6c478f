//! In-memory test harness for the upgrade flow
//!
//! Provides:
//! - `FakeCloud`: a scripted [`CloudApi`] that records every call
//! - `ScriptedOperator`: canned answers for the selection and confirm prompts
//! - `RecordingPresenter`: captures phases and per-item states
//!
//! Calls are recorded as `"<op>:<function>"` strings so tests can assert on
//! ordering with plain index comparisons.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use lambdactl::cloud::{
    CloudApi, ConfigurationUpdate, FunctionState, FunctionSummary, LayerSummary, UpdateStatus,
};
use lambdactl::error::CloudError;
use lambdactl::prompt::Operator;
use lambdactl::upgrade::{ItemState, Phase, Presenter, UpgradeSummary};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// How a function reacts once an update has been submitted
#[derive(Debug, Clone)]
pub enum UpdateBehavior {
    /// Report `InProgress` for `after_polls` reads, then `Successful`
    Succeed { after_polls: usize },
    /// Reject the submission itself
    Reject(CloudError),
    /// Accept the submission, then report `Failed` with this reason
    FailRemotely(String),
    /// Stay `InProgress` forever
    NeverSettle,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<String>,
    updates: Vec<(String, ConfigurationUpdate)>,
    /// Reads since the last submission, per function
    polls: HashMap<String, usize>,
    submitted: HashMap<String, bool>,
}

/// Scripted stand-in for the Lambda and CloudWatch Logs APIs
pub struct FakeCloud {
    functions: Vec<FunctionSummary>,
    layers: Vec<LayerSummary>,
    list_error: Option<CloudError>,
    invocations: HashMap<String, Result<Option<DateTime<Utc>>, CloudError>>,
    behaviors: HashMap<String, UpdateBehavior>,
    poll_failures: HashMap<String, usize>,
    lookup_delay: Option<Duration>,
    state: Mutex<FakeState>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self {
            functions: Vec::new(),
            layers: Vec::new(),
            list_error: None,
            invocations: HashMap::new(),
            behaviors: HashMap::new(),
            poll_failures: HashMap::new(),
            lookup_delay: None,
            state: Mutex::new(FakeState::default()),
        }
    }

    pub fn with_function(mut self, name: &str, runtime: Option<&str>, layers: &[&str]) -> Self {
        self.functions.push(FunctionSummary {
            name: name.to_string(),
            runtime: runtime.map(str::to_string),
            layers: layers.iter().map(|l| l.to_string()).collect(),
        });
        self
    }

    pub fn with_layer(mut self, layer: LayerSummary) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn with_list_error(mut self, error: CloudError) -> Self {
        self.list_error = Some(error);
        self
    }

    pub fn with_last_invocation(mut self, name: &str, at: DateTime<Utc>) -> Self {
        self.invocations.insert(name.to_string(), Ok(Some(at)));
        self
    }

    pub fn with_lookup_error(mut self, name: &str, error: CloudError) -> Self {
        self.invocations.insert(name.to_string(), Err(error));
        self
    }

    pub fn with_behavior(mut self, name: &str, behavior: UpdateBehavior) -> Self {
        self.behaviors.insert(name.to_string(), behavior);
        self
    }

    /// The first `count` status reads after a submission fail
    pub fn with_poll_failures(mut self, name: &str, count: usize) -> Self {
        self.poll_failures.insert(name.to_string(), count);
        self
    }

    /// Every last-invocation lookup sleeps this long before answering
    pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn updates(&self) -> Vec<(String, ConfigurationUpdate)> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn update_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.starts_with("update:"))
            .collect()
    }

    /// Index of the first recorded call equal to `call`
    pub fn position(&self, call: &str) -> usize {
        self.calls()
            .iter()
            .position(|c| c == call)
            .unwrap_or_else(|| panic!("call {call} was never made"))
    }

    /// Index of the last recorded call equal to `call`
    pub fn last_position(&self, call: &str) -> usize {
        self.calls()
            .iter()
            .rposition(|c| c == call)
            .unwrap_or_else(|| panic!("call {call} was never made"))
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn function(&self, name: &str) -> Result<&FunctionSummary, CloudError> {
        self.functions
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| CloudError::NotFound(format!("Function not found: {name}")))
    }
}

#[async_trait]
impl CloudApi for FakeCloud {
    async fn list_functions(&self) -> Result<Vec<FunctionSummary>, CloudError> {
        self.record("list".to_string());
        match &self.list_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.functions.clone()),
        }
    }

    async fn get_function_configuration(&self, name: &str) -> Result<FunctionState, CloudError> {
        self.record(format!("get:{name}"));
        let function = self.function(name)?;

        let mut state = self.state.lock().unwrap();
        if !state.submitted.get(name).copied().unwrap_or(false) {
            return Ok(FunctionState {
                runtime: function.runtime.clone(),
                layers: function.layers.clone(),
                last_update_status: Some(UpdateStatus::Successful),
                last_update_status_reason: None,
            });
        }

        let polls = state.polls.entry(name.to_string()).or_insert(0);
        *polls += 1;
        let read = *polls;

        let failures = self.poll_failures.get(name).copied().unwrap_or(0);
        if read <= failures {
            return Err(CloudError::Service("throttled".to_string()));
        }
        let read = read - failures;

        let behavior = self
            .behaviors
            .get(name)
            .cloned()
            .unwrap_or(UpdateBehavior::Succeed { after_polls: 0 });
        let (status, reason) = match behavior {
            UpdateBehavior::Succeed { after_polls } if read > after_polls => {
                (UpdateStatus::Successful, None)
            }
            UpdateBehavior::Succeed { .. } | UpdateBehavior::NeverSettle => {
                (UpdateStatus::InProgress, None)
            }
            UpdateBehavior::FailRemotely(reason) => (UpdateStatus::Failed, Some(reason)),
            UpdateBehavior::Reject(_) => (UpdateStatus::Successful, None),
        };

        let (runtime, layers) = state
            .updates
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, update)| {
                (
                    update.runtime.clone().or_else(|| function.runtime.clone()),
                    update
                        .layers
                        .clone()
                        .unwrap_or_else(|| function.layers.clone()),
                )
            })
            .unwrap_or_else(|| (function.runtime.clone(), function.layers.clone()));

        Ok(FunctionState {
            runtime,
            layers,
            last_update_status: Some(status),
            last_update_status_reason: reason,
        })
    }

    async fn update_function_configuration(
        &self,
        name: &str,
        update: &ConfigurationUpdate,
    ) -> Result<(), CloudError> {
        self.record(format!("update:{name}"));
        self.function(name)?;

        if let Some(UpdateBehavior::Reject(error)) = self.behaviors.get(name) {
            return Err(error.clone());
        }

        let mut state = self.state.lock().unwrap();
        state.updates.push((name.to_string(), update.clone()));
        state.submitted.insert(name.to_string(), true);
        state.polls.insert(name.to_string(), 0);
        Ok(())
    }

    async fn last_invocation(&self, name: &str) -> Result<Option<DateTime<Utc>>, CloudError> {
        self.record(format!("logs:{name}"));
        if let Some(delay) = self.lookup_delay {
            tokio::time::sleep(delay).await;
        }
        self.invocations.get(name).cloned().unwrap_or(Ok(None))
    }

    async fn list_layers(&self) -> Result<Vec<LayerSummary>, CloudError> {
        self.record("layers".to_string());
        match &self.list_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.layers.clone()),
        }
    }
}

/// Canned prompt answers
pub struct ScriptedOperator {
    selection: Option<Vec<usize>>,
    confirm: Option<bool>,
    prompts: RefCell<Vec<String>>,
    offered: RefCell<Vec<String>>,
}

impl ScriptedOperator {
    pub fn new(selection: Option<Vec<usize>>, confirm: Option<bool>) -> Self {
        Self {
            selection,
            confirm,
            prompts: RefCell::new(Vec::new()),
            offered: RefCell::new(Vec::new()),
        }
    }

    /// Confirms everything, never used for selection
    pub fn yes() -> Self {
        Self::new(None, Some(true))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    /// Labels shown by the last selection prompt
    pub fn offered(&self) -> Vec<String> {
        self.offered.borrow().clone()
    }
}

impl Operator for ScriptedOperator {
    fn select(&self, prompt: &str, items: &[String]) -> Result<Option<Vec<usize>>> {
        self.prompts.borrow_mut().push(prompt.to_string());
        *self.offered.borrow_mut() = items.to_vec();
        Ok(self.selection.clone())
    }

    fn confirm(&self, prompt: &str) -> Result<Option<bool>> {
        self.prompts.borrow_mut().push(prompt.to_string());
        Ok(self.confirm)
    }
}

/// Records everything the orchestrator reports
#[derive(Default)]
pub struct RecordingPresenter {
    pub phases: Vec<Phase>,
    pub item_states: Vec<(String, ItemState)>,
    pub summaries: Vec<UpgradeSummary>,
}

impl Presenter for RecordingPresenter {
    fn phase_changed(&mut self, phase: Phase) {
        self.phases.push(phase);
    }

    fn item_state(&mut self, name: &str, state: ItemState) {
        self.item_states.push((name.to_string(), state));
    }

    fn summary(&mut self, summary: &UpgradeSummary) {
        self.summaries.push(summary.clone());
    }
}

/// Fixed UTC timestamp on 2024-05-<day>
pub fn may(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0).unwrap()
}
