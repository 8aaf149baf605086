use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use mirrorsync::logging::init_logging;
use mirrorsync::prompt::{AssumeYes, Confirmer, TerminalConfirmer};
use mirrorsync::{Config, SyncEngine, SyncOptions};

#[derive(Parser)]
#[command(name = "mirrorsync")]
#[command(about = "Recreate Gitea push mirrors towards external git hosts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete and recreate push mirrors (default)
    Sync {
        /// Show what would change without prompting or writing
        #[arg(long)]
        dry_run: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Sync only this organization
        #[arg(long)]
        org: Option<String>,
    },

    /// List repositories that would be synced and their current mirrors
    List {
        /// Filter by organization
        #[arg(long)]
        org: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("[ERROR] {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Starting mirrorsync v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load_from(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Sync {
        dry_run: false,
        yes: false,
        org: None,
    }) {
        Commands::Sync { dry_run, yes, org } => cmd_sync(&config, dry_run, yes, org).await,
        Commands::List { org } => cmd_list(&config, org).await,
    }
}

/// Recreate push mirrors according to configuration
async fn cmd_sync(config: &Config, dry_run: bool, yes: bool, org: Option<String>) -> Result<()> {
    let engine = SyncEngine::new(config)?;
    let options = SyncOptions { dry_run, org };

    let mut confirmer: Box<dyn Confirmer> = if yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalConfirmer)
    };

    engine.run(&options, confirmer.as_mut()).await?;

    Ok(())
}

/// List repositories that would be synced
async fn cmd_list(config: &Config, org: Option<String>) -> Result<()> {
    let engine = SyncEngine::new(config)?;
    let repos = engine.discover(org).await?;

    println!("Repositories ({}):", repos.len());
    for repo in repos {
        if repo.mirrors.is_empty() {
            println!("  {}", repo.full_name());
        } else {
            println!("  {} -> {}", repo.full_name(), repo.mirrors.join(", "));
        }
    }

    Ok(())
}
