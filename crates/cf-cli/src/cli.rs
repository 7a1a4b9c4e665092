//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Churnflow - a partition-aware batch pipeline for churn prediction
#[derive(Parser, Debug)]
#[command(name = "cf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scaffold a churnflow.yml and the data directory layout
    Init(InitArgs),

    /// Run the pipeline chain (or a single stage)
    Run(RunArgs),

    /// Profile the latest raw partition and print the quality report
    Validate(ValidateArgs),

    /// List stored partitions per stage
    Ls(LsArgs),

    /// Show the feature registry ledger
    Features(FeaturesArgs),

    /// Show recent stage runs and the last run state
    Status(StatusArgs),
}

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing churnflow.yml
    #[arg(long)]
    pub force: bool,
}

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run a single stage instead of the full chain
    #[arg(long)]
    pub only: Option<String>,

    /// Target partition key (default: today, YYYY-MM-DD)
    #[arg(short, long)]
    pub key: Option<String>,

    /// Override the configured retry bound
    #[arg(long)]
    pub max_retries: Option<u32>,
}

/// Arguments for the validate command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Target partition key for the report (default: today)
    #[arg(short, long)]
    pub key: Option<String>,
}

/// Arguments for the ls command
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Restrict to one stage
    #[arg(short, long)]
    pub stage: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: LsOutput,
}

/// List output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LsOutput {
    /// Table format
    Table,
    /// JSON output
    Json,
}

/// Arguments for the features command
#[derive(Args, Debug)]
pub struct FeaturesArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: LsOutput,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Number of recent stage runs to show
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
}
