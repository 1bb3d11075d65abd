use crate::distribution::DistributionError;
use bingo_core::{GameId, UserId};
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// How a failure should be treated by the command layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input. Reported, never retried or logged as a fault.
    Validation,
    /// Valid request rejected by game state; data left untouched.
    Conflict,
    /// Storage or timeout failure; the unit of work was rolled back.
    Storage,
    /// Broken invariant inside the engine.
    Internal,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Bingo core error: {0}")]
    Core(#[from] bingo_core::CoreError),

    #[error("Distribution failed: {0}")]
    Distribution(#[from] DistributionError),

    #[error("Game title cannot be empty")]
    BlankTitle,

    #[error("Grid size {size} out of bounds ({min}-{max})")]
    GridSizeOutOfBounds { size: usize, min: usize, max: usize },

    #[error("A game needs at least one player")]
    NoPlayers,

    #[error("Event on line {position} is empty")]
    BlankEvent { position: usize },

    #[error("Not enough events: a {grid_size}x{grid_size} board needs {need}, got {have} ({} short)", .need - .have)]
    NotEnoughEvents {
        grid_size: usize,
        need: usize,
        have: usize,
    },

    #[error("Game not found: {0}")]
    GameNotFound(GameId),

    #[error("Cannot delete game {0}: it does not exist")]
    NothingToDelete(GameId),

    #[error("No active game. Specify a game id or set an active game")]
    NoActiveGame,

    #[error("Event #{display_id} not found in game {game_id}")]
    EventNotFound { game_id: GameId, display_id: u32 },

    #[error("Player {user_id} has no board in game {game_id}")]
    BoardNotFound { game_id: GameId, user_id: UserId },

    #[error("You already voted for event #{display_id}")]
    AlreadyVoted { display_id: u32, voter: UserId },

    #[error("Event #{display_id} is already resolved ({votes} votes)")]
    EventAlreadyClosed { display_id: u32, votes: usize },

    #[error("Operation '{operation}' timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::BlankTitle
            | EngineError::GridSizeOutOfBounds { .. }
            | EngineError::NoPlayers
            | EngineError::BlankEvent { .. }
            | EngineError::NotEnoughEvents { .. }
            | EngineError::GameNotFound(_)
            | EngineError::NoActiveGame
            | EngineError::EventNotFound { .. }
            | EngineError::BoardNotFound { .. } => ErrorKind::Validation,
            EngineError::NothingToDelete(_)
            | EngineError::AlreadyVoted { .. }
            | EngineError::EventAlreadyClosed { .. } => ErrorKind::Conflict,
            EngineError::Core(bingo_core::CoreError::Storage(_))
            | EngineError::Core(bingo_core::CoreError::Io(_))
            | EngineError::Timeout { .. } => ErrorKind::Storage,
            EngineError::Core(_) | EngineError::Distribution(_) | EngineError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }
}
