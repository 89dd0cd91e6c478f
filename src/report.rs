//! Terminal rendering of upgrade runs.
//!
//! Formatting lives in pure functions returning `String` so it can be tested
//! without capturing the console.

use crate::upgrade::{
    Inventory, ItemState, Phase, Presenter, UpgradePlan, UpgradePlanItem, UpgradeStatus,
    UpgradeSummary,
};
use std::io::Write;
use tracing::debug;

/// Writes human-readable progress. In JSON mode the progress goes to stderr so
/// stdout only carries the machine-readable summary.
pub struct TerminalPresenter {
    out: Box<dyn Write>,
}

impl TerminalPresenter {
    pub fn new(json: bool) -> Self {
        let out: Box<dyn Write> = if json {
            Box::new(std::io::stderr())
        } else {
            Box::new(std::io::stdout())
        };
        Self::with_writer(out)
    }

    pub fn with_writer(out: Box<dyn Write>) -> Self {
        Self { out }
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            debug!(error = %e, "Failed to write progress output");
        }
    }
}

impl Presenter for TerminalPresenter {
    fn phase_changed(&mut self, phase: Phase) {
        let line = match phase {
            Phase::Collecting => "Collecting function inventory...",
            Phase::Applying => "Applying changes (one function at a time)...",
            _ => return,
        };
        self.emit(line);
    }

    fn inventory(&mut self, inventory: &Inventory) {
        let text = format_inventory(inventory);
        self.emit(&text);
    }

    fn plan(&mut self, plan: &UpgradePlan) {
        let text = format_plan(plan);
        self.emit(&text);
    }

    fn item_state(&mut self, name: &str, state: ItemState) {
        let line = match state {
            ItemState::Pending => return,
            ItemState::Submitted => format!("  → {}: update submitted", name),
            ItemState::Polling => format!("  … {}: waiting for update to finish", name),
            ItemState::Finished(status) => format!("  {} {}: {}", status_mark(status), name, status),
        };
        self.emit(&line);
    }

    fn summary(&mut self, summary: &UpgradeSummary) {
        let text = format_summary(summary);
        self.emit(&text);
    }
}

fn status_mark(status: UpgradeStatus) -> &'static str {
    match status {
        UpgradeStatus::Successful => "✓",
        UpgradeStatus::Failed => "✗",
        UpgradeStatus::Timeout => "⏱",
    }
}

pub fn format_inventory(inventory: &Inventory) -> String {
    format!(
        "Found {} {} function(s) out of {} in total.",
        inventory.candidates.len(),
        inventory.family,
        inventory.total_functions
    )
}

fn describe_change(item: &UpgradePlanItem) -> String {
    let mut changes = Vec::new();
    if item.change_runtime {
        changes.push(format!("runtime {} → {}", item.from_runtime, item.to_runtime));
    }
    if item.change_layers {
        changes.push(format!(
            "layers [{}] → [{}]",
            item.from_layers.join(", "),
            item.to_layers.as_deref().unwrap_or_default().join(", ")
        ));
    }
    changes.join("; ")
}

pub fn format_plan(plan: &UpgradePlan) -> String {
    let mut lines = Vec::new();

    if !plan.to_upgrade.is_empty() {
        lines.push(format!("To upgrade ({}):", plan.to_upgrade.len()));
        for item in &plan.to_upgrade {
            lines.push(format!("  • {}: {}", item.name, describe_change(item)));
        }
    }

    if !plan.already_satisfied.is_empty() {
        lines.push(format!(
            "Already on {} ({}):",
            plan.target_runtime,
            plan.already_satisfied.len()
        ));
        for item in &plan.already_satisfied {
            lines.push(format!("  • {}", item.name));
        }
    }

    if !plan.not_found.is_empty() {
        lines.push("Skipped, not found among candidate functions:".to_string());
        for name in &plan.not_found {
            lines.push(format!("  • {}", name));
        }
    }

    if plan.to_upgrade.is_empty() {
        lines.push(format!(
            "Nothing to do: no selected function needs changes for {}.",
            plan.target_runtime
        ));
    }

    lines.join("\n")
}

pub fn format_summary(summary: &UpgradeSummary) -> String {
    let mut lines = vec![
        "╭─────────────────────────────────────────────────".to_string(),
        format!("│ Upgrade to {}", summary.target_runtime),
        "├─────────────────────────────────────────────────".to_string(),
        format!("│ Successful: {}", summary.successful),
        format!("│ Failed: {}", summary.failed),
        format!("│ Skipped (already satisfied): {}", summary.skipped),
    ];

    if !summary.not_found.is_empty() {
        lines.push(format!("│ Not found: {}", summary.not_found.join(", ")));
    }

    if !summary.failures.is_empty() {
        lines.push("├─────────────────────────────────────────────────".to_string());
        for failure in &summary.failures {
            lines.push(format!(
                "│ {} {} ({}): {}",
                status_mark(failure.status),
                failure.name,
                failure.status,
                failure.reason.as_deref().unwrap_or("no reason reported")
            ));
        }
    }

    lines.push("╰─────────────────────────────────────────────────".to_string());
    lines.join("\n")
}
