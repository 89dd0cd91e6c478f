use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use lambdactl::cloud::AwsCloud;
use lambdactl::config::LambdactlConfig;
use lambdactl::list::ListCommand;
use lambdactl::prompt::TerminalOperator;
use lambdactl::report::TerminalPresenter;
use lambdactl::upgrade::{
    validate_target, Orchestrator, PollSettings, Selection, UpgradeOutcome, UpgradeRequest,
};
use std::path::PathBuf;
use tracing::info;

/// Inspect AWS Lambda functions and bulk-upgrade their runtimes
#[derive(Parser)]
#[command(name = "lambdactl")]
#[command(version)]
#[command(about = "Inspect AWS Lambda functions and bulk-upgrade their runtimes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// AWS profile to use (overrides config file and environment)
    #[arg(long, value_name = "PROFILE", global = true)]
    profile: Option<String>,

    /// AWS region to use (overrides config file and environment)
    #[arg(long, value_name = "REGION", global = true)]
    region: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short = 'v', long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upgrade the runtime (and optionally the layer) of many functions
    Upgrade(UpgradeArgs),
    /// List functions or layers
    List {
        #[command(subcommand)]
        what: ListCommand,
    },
}

#[derive(Args)]
struct UpgradeArgs {
    /// Target runtime, e.g. python3.12 or nodejs20.x
    #[arg(value_name = "RUNTIME")]
    runtime: String,

    /// Upgrade every function of the target runtime family
    #[arg(long, conflicts_with = "include")]
    all: bool,

    /// Only upgrade these functions (comma-separated or repeated)
    #[arg(long, value_name = "NAMES", value_delimiter = ',')]
    include: Vec<String>,

    /// Replace all attached layers with this single layer version ARN
    #[arg(long, value_name = "ARN")]
    layer: Option<String>,

    /// Skip the final confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,

    /// Show the plan without changing anything
    #[arg(long)]
    dry_run: bool,

    /// Print the final summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Seconds to wait for each function update to finish
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(&cli)?;
    apply_cli_overrides(&mut config, &cli);
    if let Commands::Upgrade(args) = &cli.command {
        if let Some(timeout) = args.timeout {
            config.upgrade.poll_timeout_secs = timeout;
        }
    }
    // Before validation so its warnings are not lost
    lambdactl::init_tracing(&config);

    config.validate()?;

    // Single-threaded: the only concurrency is the last-invocation fan-out
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?
        .block_on(async_main(cli.command, config))
}

fn load_config(cli: &Cli) -> Result<LambdactlConfig> {
    if let Some(config_path) = &cli.config {
        LambdactlConfig::load_from_path(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))
    } else {
        LambdactlConfig::load_or_default().context("Failed to load configuration")
    }
}

fn apply_cli_overrides(config: &mut LambdactlConfig, cli: &Cli) {
    if let Some(profile) = &cli.profile {
        config.aws.profile = Some(profile.clone());
    }
    if let Some(region) = &cli.region {
        config.aws.region = Some(region.clone());
    }
    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
}

async fn async_main(command: Commands, config: LambdactlConfig) -> Result<()> {
    match command {
        Commands::Upgrade(args) => run_upgrade(args, config).await,
        Commands::List { what } => {
            let cloud = AwsCloud::from_config(&config.aws).await;
            what.run(&cloud).await
        }
    }
}

async fn run_upgrade(args: UpgradeArgs, config: LambdactlConfig) -> Result<()> {
    // Fail before the SDK is even configured
    validate_target(&args.runtime)?;

    let cloud = AwsCloud::from_config(&config.aws).await;
    let request = UpgradeRequest {
        target_runtime: args.runtime,
        selection: Selection::from_flags(args.include, args.all),
        layer: args.layer,
        assume_yes: args.yes,
        dry_run: args.dry_run,
    };

    let mut presenter = TerminalPresenter::new(args.json);
    let mut orchestrator = Orchestrator::new(&cloud, PollSettings::from(&config.upgrade));
    let outcome = orchestrator
        .run(&request, &TerminalOperator, &mut presenter)
        .await?;

    if matches!(outcome, UpgradeOutcome::Cancelled) {
        eprintln!("Aborted. No functions were changed.");
    }
    if let Some(summary) = outcome.summary() {
        info!(
            successful = summary.successful,
            failed = summary.failed,
            skipped = summary.skipped,
            "Upgrade finished"
        );
        if args.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?
            );
        }
    }

    // Partial failures are reported in the summary, not through the exit code
    Ok(())
}
