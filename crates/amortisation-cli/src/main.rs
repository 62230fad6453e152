mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::loan::{AnalyseArgs, PenaltyArgs, PrepayArgs, RecurringArgs, ScheduleArgs};

/// Loan amortisation schedules and early-repayment analysis
#[derive(Parser)]
#[command(
    name = "amort",
    version,
    about = "Loan amortisation schedules and early-repayment analysis",
    long_about = "Builds French (constant installment) and German (constant principal) \
                  amortisation tables with decimal precision, and models one-off or \
                  recurring prepayments with service fees and early-repayment penalties."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the amortisation table for a loan without prepayments
    Schedule(ScheduleArgs),
    /// Apply a one-off prepayment and compare with the baseline
    Prepay(PrepayArgs),
    /// Apply a prepayment at a fixed cadence and compare with the baseline
    Recurring(RecurringArgs),
    /// Run a full analysis from a JSON/YAML request
    Analyse(AnalyseArgs),
    /// Early-repayment penalty for an amount at a given month
    Penalty(PenaltyArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::loan::run_schedule(args),
        Commands::Prepay(args) => commands::loan::run_prepay(args),
        Commands::Recurring(args) => commands::loan::run_recurring(args),
        Commands::Analyse(args) => commands::loan::run_analyse(args),
        Commands::Penalty(args) => commands::loan::run_penalty(args),
        Commands::Version => {
            println!("amort {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
