//! Lineage Forge - Command Line Entry Point
//!
//! `replay` runs a TOML script against a catalog and prints the resulting
//! report. `fuzz` runs seeded random walks and checks the selection set
//! invariants after every step.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use lineage_forge::core::config::set_config;
use lineage_forge::core::error::Result;
use lineage_forge::replay::{replay, soak, ReplayReport, ReplayScript, StepOutcome};
use lineage_forge::{AbilityCatalog, AllocationEngine, EngineConfig, Lineage, PriorityRank};

#[derive(Parser, Debug)]
#[command(name = "lineage-forge")]
#[command(about = "Validate character ability allocations against a lineage catalog")]
struct Args {
    /// Catalog file or directory of .toml catalogs
    #[arg(long, default_value = "data/catalogs")]
    catalog: PathBuf,

    /// Engine config (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a scripted sequence of toggles
    Replay {
        script: PathBuf,

        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Run random walks and check invariants after every step
    Fuzz {
        #[arg(long)]
        lineage: Lineage,

        #[arg(long, default_value_t = PriorityRank::A)]
        rank: PriorityRank,

        /// Number of walks
        #[arg(long, default_value_t = 100)]
        walks: usize,

        /// Steps per walk
        #[arg(long, default_value_t = 200)]
        steps: usize,

        /// Seed of the first walk; later walks increment it
        #[arg(long)]
        seed: Option<u64>,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Text,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lineage_forge=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if set_config(config.clone()).is_err() {
        tracing::warn!("engine config already initialized");
    }

    let catalog = AbilityCatalog::load(&args.catalog)?;
    let engine = AllocationEngine::new(&catalog, &config);

    match args.command {
        Command::Replay { script, format } => {
            let script = ReplayScript::load(&script)?;
            let report = replay(&engine, &script)?;
            match format {
                Format::Json => println!("{}", report.to_json()?),
                Format::Text => print_report(&report),
            }
        }
        Command::Fuzz {
            lineage,
            rank,
            walks,
            steps,
            seed,
            format,
        } => {
            let seed = seed.unwrap_or_else(rand::random);
            let report = soak(&engine, lineage, rank, walks, steps, seed)?;
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                Format::Text => {
                    println!("Soak: {} at rank {}", lineage, rank);
                    println!("=============");
                    println!("Seed: {}", seed);
                    println!("Walks: {}  Steps: {}", report.walks, report.steps);
                    println!("Applied: {}  Rejected: {}", report.applied, report.rejected);
                    for failure in &report.failures {
                        println!(
                            "FAILED seed {} step {}: {:?}",
                            failure.seed, failure.step, failure.violations
                        );
                    }
                }
            }
            if !report.is_clean() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn print_report(report: &ReplayReport) {
    println!("Replay: {} at rank {}", report.lineage, report.rank);
    println!("=============");
    for record in &report.steps {
        let status = match &record.outcome {
            StepOutcome::Applied(delta) => format!(
                "applied (+{} -{} ~{})",
                delta.added.len(),
                delta.removed.len(),
                delta.updated.len()
            ),
            StepOutcome::Rejected { code, message } => format!("rejected [{}] {}", code, message),
            StepOutcome::RankChanged { warnings } => format!("{} warning(s)", warnings.len()),
            StepOutcome::LineageChanged => "lineage changed".to_string(),
            StepOutcome::Cleared => "cleared".to_string(),
        };
        println!("{:>4}  {:<48} {}", record.index, record.action, status);
    }

    println!();
    println!("Selections:");
    for id in &report.selections {
        println!("  {}", id);
    }
    println!("Granted:");
    for id in &report.granted {
        println!("  {}", id);
    }
    println!("Budgets:");
    for line in &report.budgets {
        match line.ceiling {
            Some(ceiling) => println!("  {:<22} {:>3} / {}", line.budget.as_str(), line.used, ceiling),
            None => println!("  {:<22} {:>3}", line.budget.as_str(), line.used),
        }
    }
    for warning in &report.warnings {
        println!("WARNING: {:?}", warning);
    }
    for violation in &report.violations {
        println!("VIOLATION: {:?}", violation);
    }
}
