//! Roster command line front end.
//!
//! # Responsibility
//! - Load configuration, start logging and open the database.
//! - Map each subcommand onto one core operation and print its result.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use roster_core::db::open_db;
use roster_core::{
    init_logging, ArtifactCache, AssignmentId, AssignmentService, Period, PersonId, PlanService,
    RosterConfig,
};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Plan duty rosters and export them")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, default_value = "roster.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill every open slot between two dates and auto-assign people
    Plan {
        /// First day, YYYY-MM-DD
        #[arg(long)]
        from: String,
        /// Last day (inclusive), YYYY-MM-DD
        #[arg(long)]
        to: String,
    },

    /// Put a person on one assignment
    Update {
        #[arg(long)]
        assignment: AssignmentId,
        #[arg(long)]
        person: PersonId,
    },

    /// Show who could take an assignment
    Available {
        #[arg(long)]
        assignment: AssignmentId,
    },

    /// Print the path of the rendered roster for a range
    Export {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },

    /// Delete exports older than the configured retention
    Sweep,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = RosterConfig::from_file(&cli.config)?;
    config.ensure_dirs()?;
    let log_dir = absolute(&config.log.dir)?;
    init_logging(&config.log.level, &log_dir)?;

    let conn = open_db(&config.database.path)
        .with_context(|| format!("opening {}", config.database.path.display()))?;

    match cli.command {
        Commands::Plan { from, to } => {
            let period = Period::parse(&from, &to)?;
            let outcome = PlanService::new(&conn).create_plan_data(&period)?;
            print_json(&outcome)?;
        }
        Commands::Update { assignment, person } => {
            let updated = AssignmentService::new(&conn).update_plan_element(assignment, person)?;
            print_json(&updated)?;
        }
        Commands::Available { assignment } => {
            let detail = PlanService::new(&conn).get_plan_element(assignment)?;
            let availability = AssignmentService::new(&conn).get_all_person_available(&detail)?;
            print_json(&availability)?;
        }
        Commands::Export { from, to } => {
            let period = Period::parse(&from, &to)?;
            let path = ArtifactCache::new(&conn, &config.artifacts.dir).get_or_create(&period)?;
            println!("{}", path.display());
        }
        Commands::Sweep => {
            let today = chrono::Local::now().date_naive();
            let removed = ArtifactCache::new(&conn, &config.artifacts.dir)
                .remove_expired(today, config.artifacts.retention_months)?;
            info!("event=cli_sweep module=cli status=ok removed={}", removed.len());
            print_json(&removed)?;
        }
    }
    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("resolving working directory")?;
    Ok(cwd.join(path))
}
