mod commands;
mod config;

use bingo_core::{SqliteStore, UserId};
use bingo_engine::{EngineConfig, EngineError, ErrorKind, GameManager};
use clap::{Parser, Subcommand};
use commands::Session;
use config::CliConfig;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "bingo")]
#[command(about = "Consensus bingo - players vote events closed and race to complete a line")]
#[command(version)]
struct Cli {
    /// Data directory for the game database
    #[arg(short, long, global = true, env = "BINGO_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Database file name inside the data directory
    #[arg(long, global = true, env = "BINGO_DB")]
    db: Option<String>,

    /// User id (or mention) to act as
    #[arg(short, long, global = true, env = "BINGO_USER_ID")]
    actor: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Game(commands::GameCommands),

    #[command(flatten)]
    Play(commands::PlayCommands),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Game(cmd) => cmd.name(),
            Commands::Play(cmd) => cmd.name(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Variables already in the environment take precedence over .env
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let defaults = CliConfig::default();
    let actor: Option<UserId> = match cli.actor.as_deref() {
        Some(raw) => Some(commands::parse::parse_user_id(raw)?),
        None => None,
    };
    let config = CliConfig {
        data_dir: cli.data_dir.unwrap_or(defaults.data_dir),
        database_file: cli.db.unwrap_or(defaults.database_file),
        actor,
        verbose: cli.verbose,
    };

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_filter()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Ensure data directory exists
    tokio::fs::create_dir_all(&config.data_dir).await?;

    let core_config = config.core_config();
    core_config.validate()?;
    let store = SqliteStore::new(&config.database_path(), &core_config).await?;
    let session = Session {
        manager: GameManager::with_config(Arc::new(store), EngineConfig::from(&core_config)),
        actor: config.actor,
    };

    let name = cli.command.name();
    let actor = config
        .actor
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());

    // Execute command
    let result = match cli.command {
        Commands::Game(cmd) => commands::handle_game_command(cmd, &session).await,
        Commands::Play(cmd) => commands::handle_play_command(cmd, &session).await,
    };

    match result {
        Ok(()) => tracing::info!("ok {} actor={}", name, actor),
        Err(e) => {
            report_error(name, &actor, &e);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn report_error(name: &str, actor: &str, error: &anyhow::Error) {
    let Some(engine_error) = error.downcast_ref::<EngineError>() else {
        tracing::warn!("err {} actor={} msg={:?}", name, actor, error.to_string());
        eprintln!("Error: {:#}", error);
        return;
    };

    match engine_error.kind() {
        ErrorKind::Storage | ErrorKind::Internal => {
            tracing::error!("err {} actor={} msg={:?}", name, actor, engine_error.to_string())
        }
        ErrorKind::Validation | ErrorKind::Conflict => {
            tracing::warn!("err {} actor={} msg={:?}", name, actor, engine_error.to_string())
        }
    }

    match engine_error {
        EngineError::NoActiveGame => {
            eprintln!("Error: No active game");
            eprintln!("Pass --game <id> or pick one with 'bingo set-active <id>'");
        }
        EngineError::GameNotFound(id) | EngineError::NothingToDelete(id) => {
            eprintln!("Error: Game {} not found", id);
            eprintln!("Use 'bingo list-games' to see available games");
        }
        EngineError::EventNotFound { display_id, .. } => {
            eprintln!("Error: Event #{} not found", display_id);
            eprintln!("Use 'bingo list-events' to see event numbers");
        }
        EngineError::NotEnoughEvents { need, have, .. } => {
            eprintln!("Error: Not enough events");
            eprintln!("Need: {}, Provided: {}", need, have);
        }
        EngineError::Timeout { .. } => {
            eprintln!("Error: {}", engine_error);
            eprintln!("The database may be busy, try again");
        }
        _ => {
            eprintln!("Error: {}", engine_error);
        }
    }
}
