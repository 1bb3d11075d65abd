use super::parse::{parse_players, read_events_file};
use super::{print_json, Session};
use anyhow::{anyhow, Result};
use bingo_core::GameId;
use bingo_engine::GameRequest;
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Table};
use dialoguer::Confirm;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum GameCommands {
    /// Create a new game and deal a board to every player
    NewGame {
        /// Game title
        title: String,
        /// Board side length (2-10)
        #[arg(short, long, default_value_t = 5)]
        grid_size: usize,
        /// Players as mentions (<@123>) or ids
        #[arg(short, long, required = true, num_args = 1..)]
        players: Vec<String>,
        /// File with one event description per line
        #[arg(short, long)]
        events_file: Option<PathBuf>,
        /// Event description (repeatable)
        #[arg(long = "event")]
        events: Vec<String>,
    },
    /// Delete a game with all of its boards, events and votes
    DeleteGame {
        game_id: GameId,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Make a game the active one
    SetActive { game_id: GameId },
    /// List all games, newest first
    ListGames {
        #[arg(long)]
        json: bool,
    },
}

impl GameCommands {
    pub fn name(&self) -> &'static str {
        match self {
            GameCommands::NewGame { .. } => "new-game",
            GameCommands::DeleteGame { .. } => "delete-game",
            GameCommands::SetActive { .. } => "set-active",
            GameCommands::ListGames { .. } => "list-games",
        }
    }
}

pub async fn handle_game_command(cmd: GameCommands, session: &Session) -> Result<()> {
    let manager = &session.manager;

    match cmd {
        GameCommands::NewGame {
            title,
            grid_size,
            players,
            events_file,
            events,
        } => {
            let players = parse_players(&players)?;
            let mut descriptions = match events_file {
                Some(path) => read_events_file(&path).await?,
                None => Vec::new(),
            };
            descriptions.extend(events);

            let request = GameRequest::new(title, grid_size, players, descriptions);
            let event_count = request.events.len();
            let game = manager.create_game(request).await?;
            let players = manager.players(Some(game.id)).await?;

            println!("Game created successfully!");
            println!("  ID: {}", game.id);
            println!("  Title: {}", game.title);
            println!("  Grid: {0}x{0}", game.grid_size);
            println!("  Events: {}", event_count);
            println!(
                "  Players: {}",
                players
                    .iter()
                    .map(|id| format!("<@{}>", id))
                    .collect::<Vec<_>>()
                    .join(" ")
            );
            if game.is_active {
                println!("  This is now the active game.");
            } else {
                println!("  Use 'bingo set-active {}' to make it active.", game.id);
            }
        }

        GameCommands::DeleteGame { game_id, force } => {
            if !force {
                let confirm = Confirm::new()
                    .with_prompt(format!(
                        "Are you sure you want to delete game {}? All boards and votes will be lost.",
                        game_id
                    ))
                    .default(false)
                    .interact()
                    .map_err(|e| anyhow!("Prompt failed: {}", e))?;

                if !confirm {
                    println!("Deletion cancelled.");
                    return Ok(());
                }
            }

            let deleted = manager.delete_game(game_id).await?;
            println!("Game {} '{}' deleted.", deleted.game.id, deleted.game.title);
            if let Some(next) = deleted.new_active {
                println!("Game {} is now active.", next);
            } else if deleted.game.is_active {
                println!("No games left to activate.");
            }
        }

        GameCommands::SetActive { game_id } => {
            let game = manager.set_active_game(game_id).await?;
            println!("Game {} '{}' is now active.", game.id, game.title);
        }

        GameCommands::ListGames { json } => {
            let games = manager.list_games().await?;
            if json {
                return print_json(&games);
            }

            if games.is_empty() {
                println!("No games found.");
                println!("Create one with: bingo new-game <title> --players <@id>... --events-file <file>");
                return Ok(());
            }

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["ID", "Title", "Grid", "Players", "Open", "Closed", "Active"]);

            for summary in &games {
                table.add_row(vec![
                    summary.game.id.to_string(),
                    summary.game.title.clone(),
                    format!("{0}x{0}", summary.game.grid_size),
                    summary.players.to_string(),
                    summary.open_events.to_string(),
                    summary.closed_events.to_string(),
                    if summary.game.is_active { "*" } else { "" }.to_string(),
                ]);
            }

            println!("{}", table);
        }
    }

    Ok(())
}
