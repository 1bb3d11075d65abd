pub mod game;
pub mod parse;
pub mod play;

pub use game::{handle_game_command, GameCommands};
pub use play::{handle_play_command, PlayCommands};

use anyhow::{anyhow, Result};
use bingo_core::{SqliteStore, UserId};
use bingo_engine::GameManager;

pub struct Session {
    pub manager: GameManager<SqliteStore>,
    pub actor: Option<UserId>,
}

impl Session {
    pub fn actor(&self) -> Result<UserId> {
        self.actor
            .ok_or_else(|| anyhow!("No user given. Pass --actor or set BINGO_USER_ID"))
    }
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
