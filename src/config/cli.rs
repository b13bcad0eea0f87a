use crate::domain::model::RunMode;
use crate::utils::error::Result;
use crate::utils::validation::{validate_positive_number, Validate};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "random-basket")]
#[command(about = "Buys random books you do not own yet until a budget is spent")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "random-basket.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Pick items and print the order without recording or submitting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Override purchase.max_cycles from the config file
    #[arg(long)]
    pub max_cycles: Option<usize>,
}

impl CliArgs {
    pub fn run_mode(&self) -> RunMode {
        if self.dry_run {
            RunMode::DryRun
        } else {
            RunMode::Live
        }
    }
}

impl Validate for CliArgs {
    fn validate(&self) -> Result<()> {
        if let Some(cycles) = self.max_cycles {
            validate_positive_number("--max-cycles", cycles, 1)?;
        }
        Ok(())
    }
}
