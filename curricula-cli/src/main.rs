//! Curricula CLI - Command line interface for curricula
//!
//! Course catalogs, prerequisite trees and versioned academic plans.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use curricula_core::{Config, ErrorKind};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{CatalogArgs, Context, PlanArgs, RequirementArgs, ShareArgs};

/// Curricula: course prerequisites and academic plan management
#[derive(Parser, Debug)]
#[command(name = "curricula")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Config file (defaults to ~/.config/curricula/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file (overrides config and env)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Manage the course catalog
    #[command(visible_alias = "c")]
    Catalog(CatalogArgs),

    /// Manage academic plans
    #[command(visible_alias = "p")]
    Plan(PlanArgs),

    /// Manage program requirements
    Requirement(RequirementArgs),

    /// Share plans through tokens
    Share(ShareArgs),

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err, json),
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    // Load configuration with overrides
    let config = Config::load_with_overrides(cli.config.as_deref(), cli.db.clone())?;

    if cli.verbose {
        tracing::info!(
            db_path = %config.database.path.display(),
            max_semester_credits = config.validation.max_semester_credits,
            min_total_credits = config.validation.min_total_credits,
            programs = ?config.validation.valid_programs,
            "Configuration loaded"
        );
    }

    let ctx = Context {
        config,
        json: cli.json,
    };

    match cli.command {
        Some(Commands::Version) => {
            println!("curricula {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Catalog(args)) => args.execute(&ctx).await?,
        Some(Commands::Plan(args)) => args.execute(&ctx).await?,
        Some(Commands::Requirement(args)) => args.execute(&ctx).await?,
        Some(Commands::Share(args)) => args.execute(&ctx).await?,
        Some(Commands::Config) => {
            if ctx.json {
                println!("{}", serde_json::to_string_pretty(&ctx.config)?);
                return Ok(());
            }

            println!("Curricula Configuration");
            println!("=======================");
            println!();
            println!("{}", toml::to_string_pretty(&ctx.config)?);
            match cli.config.or_else(Config::default_config_path) {
                Some(path) if path.exists() => println!("Config file: {} (exists)", path.display()),
                Some(path) => println!(
                    "Config file: {} (not found - using defaults)",
                    path.display()
                ),
                None => println!("Config file: (no config directory)"),
            }
        }
        None => {
            println!("Curricula - course prerequisites and academic plan management");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

/// Exit status for a failed command
fn exit_status(kind: Option<ErrorKind>) -> u8 {
    match kind {
        Some(kind) if kind.is_validation() => 2,
        Some(ErrorKind::NotFound) => 3,
        Some(
            ErrorKind::InvalidStatusTransition
            | ErrorKind::MissingRequirementDefinition
            | ErrorKind::ShareExpired,
        ) => 4,
        _ => 1,
    }
}

fn report(err: &anyhow::Error, json: bool) -> ExitCode {
    let core = err.downcast_ref::<curricula_core::Error>();
    let kind = core.map(curricula_core::Error::kind);

    if json {
        let body = serde_json::json!({
            "error": {
                "kind": kind.map(|k| k.code()),
                "message": format!("{:#}", err),
                "rejection": core.and_then(curricula_core::Error::rejection),
            }
        });
        eprintln!("{}", body);
    } else {
        eprintln!("Error: {:#}", err);
    }

    ExitCode::from(exit_status(kind))
}
