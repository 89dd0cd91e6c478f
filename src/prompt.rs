//! Operator prompts.
//!
//! Both prompts are blocking and single-shot. `Ok(None)` means the operator
//! cancelled (Esc / q), which callers treat as an abort rather than an empty
//! answer.

use anyhow::{Context, Result};
use dialoguer::{Confirm, MultiSelect};

pub trait Operator {
    /// Pick a subset of `items`; returns the chosen indices.
    fn select(&self, prompt: &str, items: &[String]) -> Result<Option<Vec<usize>>>;

    fn confirm(&self, prompt: &str) -> Result<Option<bool>>;
}

/// Interactive terminal prompts
pub struct TerminalOperator;

impl Operator for TerminalOperator {
    fn select(&self, prompt: &str, items: &[String]) -> Result<Option<Vec<usize>>> {
        MultiSelect::new()
            .with_prompt(prompt)
            .items(items)
            .report(false)
            .interact_opt()
            .context("Interactive selection requires a terminal (use --all or --include)")
    }

    fn confirm(&self, prompt: &str) -> Result<Option<bool>> {
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact_opt()
            .context("Confirmation requires a terminal (use --yes to skip it)")
    }
}
