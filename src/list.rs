//! List command - read-only views of functions and layers

use crate::cloud::{CloudApi, FunctionSummary, LayerSummary};
use crate::error::UpgradeError;
use crate::upgrade::{derive_family, RuntimeFamily};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

#[derive(Subcommand)]
pub enum ListCommand {
    /// List functions with their runtime and layers
    Functions(FunctionsArgs),
    /// List layers with their latest version
    Layers(LayersArgs),
}

impl ListCommand {
    pub async fn run(self, api: &dyn CloudApi) -> Result<()> {
        match self {
            ListCommand::Functions(args) => execute_functions(api, args).await,
            ListCommand::Layers(args) => execute_layers(api, args).await,
        }
    }
}

#[derive(Args)]
pub struct FunctionsArgs {
    /// Only show one runtime family: "python" or "nodejs"
    #[arg(long)]
    pub family: Option<RuntimeFamily>,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct LayersArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct FunctionRow<'a> {
    name: &'a str,
    runtime: Option<&'a str>,
    family: RuntimeFamily,
    layers: &'a [String],
}

async fn execute_functions(api: &dyn CloudApi, args: FunctionsArgs) -> Result<()> {
    let mut functions = api
        .list_functions()
        .await
        .map_err(|e| UpgradeError::from_listing("functions", e))?;
    functions.sort_by(|a, b| a.name.cmp(&b.name));
    let rows = function_rows(&functions, args.family);

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&rows).context("Failed to serialize functions")?
        );
    } else {
        println!("{}", format_function_table(&rows));
    }
    Ok(())
}

async fn execute_layers(api: &dyn CloudApi, args: LayersArgs) -> Result<()> {
    let mut layers = api
        .list_layers()
        .await
        .map_err(|e| UpgradeError::from_listing("layers", e))?;
    layers.sort_by(|a, b| a.name.cmp(&b.name));

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&layers).context("Failed to serialize layers")?
        );
    } else {
        println!("{}", format_layer_table(&layers));
    }
    Ok(())
}

fn function_rows(
    functions: &[FunctionSummary],
    family: Option<RuntimeFamily>,
) -> Vec<FunctionRow<'_>> {
    functions
        .iter()
        .map(|f| FunctionRow {
            name: &f.name,
            runtime: f.runtime.as_deref(),
            family: f
                .runtime
                .as_deref()
                .map(derive_family)
                .unwrap_or(RuntimeFamily::Unsupported),
            layers: &f.layers,
        })
        .filter(|row| family.map_or(true, |wanted| row.family == wanted))
        .collect()
}

fn format_function_table(rows: &[FunctionRow<'_>]) -> String {
    if rows.is_empty() {
        return "No functions found.".to_string();
    }

    let name_width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0).max(4);
    let runtime_width = rows
        .iter()
        .map(|r| r.runtime.unwrap_or("-").len())
        .max()
        .unwrap_or(0)
        .max(7);

    let mut lines = vec![format!(
        "{:<name_width$}  {:<runtime_width$}  LAYERS",
        "NAME", "RUNTIME"
    )];
    for row in rows {
        let layers = if row.layers.is_empty() {
            "-".to_string()
        } else {
            row.layers.join(", ")
        };
        lines.push(format!(
            "{:<name_width$}  {:<runtime_width$}  {}",
            row.name,
            row.runtime.unwrap_or("-"),
            layers
        ));
    }
    lines.join("\n")
}

fn format_layer_table(layers: &[LayerSummary]) -> String {
    if layers.is_empty() {
        return "No layers found.".to_string();
    }

    let name_width = layers.iter().map(|l| l.name.len()).max().unwrap_or(0).max(4);
    let mut lines = vec![format!(
        "{:<name_width$}  {:<7}  {:<30}  ARN",
        "NAME", "VERSION", "RUNTIMES"
    )];
    for layer in layers {
        let version = layer
            .latest_version()
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        let runtimes = if layer.compatible_runtimes.is_empty() {
            "-".to_string()
        } else {
            layer.compatible_runtimes.join(",")
        };
        lines.push(format!(
            "{:<name_width$}  {:<7}  {:<30}  {}",
            layer.name,
            version,
            runtimes,
            layer.latest_version_arn.as_deref().unwrap_or("-")
        ));
    }
    lines.join("\n")
}
