use super::parse::parse_user_id;
use super::{print_json, Session};
use anyhow::Result;
use bingo_core::{BoardView, GameId};
use bingo_engine::VoteReport;
use clap::Subcommand;
use comfy_table::{presets::UTF8_FULL, Cell, Table};

const CLOSED_MARK: &str = "[x]";

#[derive(Subcommand)]
pub enum PlayCommands {
    /// List a game's events with status and vote counts
    ListEvents {
        /// Game to inspect (defaults to the active game)
        #[arg(short, long)]
        game: Option<GameId>,
        #[arg(long)]
        json: bool,
    },
    /// Show a player's board
    ViewBoard {
        /// Player mention or id (defaults to --actor)
        user: Option<String>,
        /// Game to inspect (defaults to the active game)
        #[arg(short, long)]
        game: Option<GameId>,
        #[arg(long)]
        json: bool,
    },
    /// Vote that an event has happened
    Vote {
        /// Event number as shown by list-events
        event_id: u32,
        /// Game to vote in (defaults to the active game)
        #[arg(short, long)]
        game: Option<GameId>,
    },
}

impl PlayCommands {
    pub fn name(&self) -> &'static str {
        match self {
            PlayCommands::ListEvents { .. } => "list-events",
            PlayCommands::ViewBoard { .. } => "view-board",
            PlayCommands::Vote { .. } => "vote",
        }
    }
}

pub async fn handle_play_command(cmd: PlayCommands, session: &Session) -> Result<()> {
    let manager = &session.manager;

    match cmd {
        PlayCommands::ListEvents { game, json } => {
            let listing = manager.list_events(game).await?;
            if json {
                return print_json(&listing);
            }

            println!(
                "Game {} '{}': {} open, {} closed. {} of {} players must vote to close an event.",
                listing.game.id,
                listing.game.title,
                listing.open,
                listing.closed,
                listing.required,
                listing.players
            );

            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            table.set_header(vec!["#", "Event", "Status", "Votes", "Voters"]);

            for tally in &listing.events {
                table.add_row(vec![
                    tally.event.display_id.to_string(),
                    tally.event.description.clone(),
                    tally.event.status.to_string(),
                    format!("{}/{}", tally.votes, listing.required),
                    listing
                        .voters
                        .get(&tally.event.display_id)
                        .map(|ids| {
                            ids.iter()
                                .map(|id| format!("<@{}>", id))
                                .collect::<Vec<_>>()
                                .join(" ")
                        })
                        .unwrap_or_default(),
                ]);
            }

            println!("{}", table);
        }

        PlayCommands::ViewBoard { user, game, json } => {
            let user_id = match user {
                Some(user) => parse_user_id(&user)?,
                None => session.actor()?,
            };

            let board = manager.get_board(game, user_id).await?;
            if json {
                return print_json(&board);
            }

            println!(
                "Board of <@{}> in game {} '{}'",
                user_id, board.game.id, board.game.title
            );
            println!("{}", render_board(&board.view));
            match board.line {
                Some(line) => println!("BINGO! Completed {}.", line),
                None => println!("No completed line yet."),
            }
        }

        PlayCommands::Vote { event_id, game } => {
            let voter = session.actor()?;
            let report = manager.submit_vote(game, event_id, voter).await?;
            print_vote(&report);
        }
    }

    Ok(())
}

fn render_board(view: &BoardView) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);

    for row in 0..view.board.grid_size {
        let cells: Vec<Cell> = (0..view.board.grid_size)
            .map(|column| match view.square(row, column) {
                Some(square) if square.status.is_open() => {
                    Cell::new(format!("#{}\n{}", square.display_id, square.description))
                }
                Some(square) => Cell::new(format!(
                    "#{} {}\n{}",
                    square.display_id, CLOSED_MARK, square.description
                )),
                None => Cell::new("?"),
            })
            .collect();
        table.add_row(cells);
    }

    table
}

fn print_vote(report: &VoteReport) {
    let event = &report.event;
    println!(
        "Vote recorded for #{} '{}' ({}/{}).",
        event.display_id, event.description, report.votes, report.required
    );

    if !report.closed {
        println!("{} more vote(s) needed to close it.", report.remaining());
        return;
    }

    println!("Event #{} is now closed.", event.display_id);
    for winner in &report.winners {
        println!("BINGO! <@{}> completed {}.", winner.user_id, winner.line);
    }
    if let Some(failure) = &report.scan_failure {
        println!("The event was closed, but checking boards for winners failed: {}", failure);
    }
}
