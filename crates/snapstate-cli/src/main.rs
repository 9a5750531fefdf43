mod backend;
mod report;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use snapstate_config::ConfigLoader;
use snapstate_migrations::{MigrationRegistry, read_version};
use snapstate_store::{RestoreOptions, restore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::report::{MigrationReport, version_label};

#[derive(Parser)]
#[command(
    name = "snapstate",
    version,
    about = "SnapState - persisted session snapshot migrations"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the config value.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Configuration directory
    #[arg(long, global = true, env = "SNAPSTATE_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Snapshot location, overriding the configured one
    #[arg(long, global = true)]
    state: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upgrade the stored snapshot to the latest schema
    Migrate {
        /// Migrate in memory only, leave the store untouched
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the stored and latest schema versions
    Status,

    /// List registered migration steps
    Steps,

    /// Create the configuration and data directories
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_loader = match &cli.config_dir {
        Some(dir) => ConfigLoader::with_dir(dir),
        None => ConfigLoader::new()?,
    };
    let config = config_loader.load()?;

    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .init();

    let registry = MigrationRegistry::builtin();
    let state_path = cli
        .state
        .clone()
        .unwrap_or_else(|| config.state_path(config_loader.config_dir()));
    info!(
        "config dir {}, {:?} store at {}",
        config_loader.config_dir().display(),
        config.state.backend,
        state_path.display()
    );

    match cli.command {
        Commands::Migrate { dry_run } => {
            let store = backend::open_store(config.state.backend, &state_path, dry_run)?;
            let options = RestoreOptions {
                dry_run,
                quarantine_unrestorable: config.state.quarantine_unrestorable,
            };
            let restored = restore(store.as_ref(), &registry, &options);
            if restored.is_recovered() {
                warn!("previous session in {} was not restored", store.describe());
            }
            MigrationReport::new(store.describe(), &restored, &registry, dry_run).print_summary();
        }
        Commands::Status => {
            let store = backend::open_store(config.state.backend, &state_path, true)?;
            println!("Store:   {}", store.describe());
            println!("Latest:  {}", version_label(registry.latest()));

            let snapshot = match store.load() {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    println!("Stored:  unreadable ({e})");
                    return Ok(());
                }
            };
            let stored = match read_version(&snapshot) {
                Ok(stored) => stored,
                Err(e) => {
                    println!("Stored:  invalid ({e})");
                    return Ok(());
                }
            };
            println!("Stored:  {}", version_label(stored));

            let pending = registry.pending(stored);
            if pending.is_empty() {
                println!("Pending: (none)");
            } else {
                println!("Pending:");
                for step in pending {
                    println!("  {} {}", step.version, step.name);
                }
            }
        }
        Commands::Steps => {
            println!("Registered migrations:");
            for step in registry.steps() {
                println!("  {} {}", step.version, step.name);
            }
        }
        Commands::Init => {
            config_loader.ensure_dirs(&config)?;
            println!("SnapState setup");
            println!("Config directory: {}", config_loader.config_dir().display());
            println!("Snapshot:         {}", state_path.display());
            if !config_loader.config_file_exists() {
                println!("No config.yml found, defaults are in effect.");
            }
        }
    }

    Ok(())
}
