//! Command-line interface.

mod config;
mod report;

pub use config::{ConfigCommand, run_config_command};

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::budget::{Budget, BudgetExport};
use crate::reporting::{MAX_SCHEDULE_MONTHS, default_s_curve};
use crate::settings::{CONFIG_PATH_ENV, Settings};

#[derive(Parser, Debug)]
#[command(name = "orcamento")]
#[command(version, about = "Construction budget calculator: costs, BDI, ABC curve and disbursement schedule")]
pub struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true, env = CONFIG_PATH_ENV)]
    pub config: Option<PathBuf>,

    /// Load quantities and settings from a budget export instead of the settings file
    #[arg(long, global = true)]
    pub budget: Option<PathBuf>,

    /// Set a composition quantity for this run (e.g. --set ALV-001=120,5)
    #[arg(long = "set", value_name = "CODE=QTY", global = true)]
    pub quantities: Vec<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Totals, BDI, sell price and cost per m²
    Summary,

    /// Material requirements as CSV
    Materials {
        /// Group materials by service instead of consolidating them
        #[arg(short, long)]
        detailed: bool,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// ABC curve of the selected services
    Abc,

    /// Monthly disbursement schedule along the S-curve
    Schedule {
        /// Project duration in months
        #[arg(
            short,
            long,
            default_value_t = 12,
            value_parser = clap::value_parser!(u32).range(1..=MAX_SCHEDULE_MONTHS as i64)
        )]
        months: u32,
    },

    /// Two-channel BDI simulation (labor and material)
    Bdi,

    /// Write the budget as an export JSON document
    Export {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// List the composition catalog with current unit costs
    Compositions,

    /// Manage settings
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Settings file in effect.
    pub fn settings_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Settings::default_path)
    }
}

/// Run a parsed command line.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let settings_path = cli.settings_path();

    if let Command::Config(cmd) = cli.command {
        return run_config_command(cmd, &settings_path);
    }

    let budget = load_budget(&settings_path, cli.budget.as_deref(), &cli.quantities)?;

    match cli.command {
        Command::Summary => println!("{}", report::summary(&budget)),
        Command::Materials { detailed, output } => {
            let csv = if detailed {
                budget.detailed_csv()?
            } else {
                budget.materials_csv()?
            };
            match output {
                Some(path) => {
                    std::fs::write(&path, csv)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{}", csv),
            }
        }
        Command::Abc => println!("{}", report::abc(&budget)),
        Command::Schedule { months } => {
            println!("{}", report::schedule(&budget, months, &default_s_curve()))
        }
        Command::Bdi => println!("{}", report::bdi(&budget)),
        Command::Export { output } => {
            let json = budget.export(chrono::Utc::now()).to_json()?;
            std::fs::write(&output, json)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("Wrote {}", output.display());
        }
        Command::Compositions => println!("{}", report::compositions(&budget)),
        Command::Config(_) => {}
    }

    Ok(())
}

/// Build the budget for a reporting command.
fn load_budget(
    settings_path: &Path,
    export_path: Option<&Path>,
    quantities: &[String],
) -> anyhow::Result<Budget> {
    let mut budget = Budget::seeded();

    match export_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            let export = BudgetExport::from_json(&json)
                .with_context(|| format!("loading budget {}", path.display()))?;
            budget.import(&export)?;
        }
        None => {
            let settings = Settings::load_or_default(settings_path)
                .with_context(|| format!("loading settings from {}", settings_path.display()))?;
            settings
                .apply_to(&mut budget)
                .with_context(|| format!("applying settings from {}", settings_path.display()))?;
        }
    }

    for pair in quantities {
        let Some((code, quantity)) = pair.split_once('=') else {
            anyhow::bail!("Expected CODE=QTY, got '{}'", pair);
        };
        budget.set_quantity_str(code.trim(), quantity)?;
    }

    Ok(budget)
}
