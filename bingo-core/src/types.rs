use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type GameId = i64;
pub type EventId = i64;
pub type BoardId = i64;
/// Chat platform user id (snowflake).
pub type UserId = i64;

pub const MIN_GRID_SIZE: usize = 2;
pub const MAX_GRID_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub title: String,
    pub grid_size: usize,
    pub is_active: bool,
}

/// Game row plus the counts shown by `list-games`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSummary {
    pub game: Game,
    pub players: usize,
    pub open_events: usize,
    pub closed_events: usize,
}

/// Resolution state of an event. The only legal move is `Open -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventStatus {
    Open,
    Closed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Open => "OPEN",
            EventStatus::Closed => "CLOSED",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, EventStatus::Open)
    }

    pub fn can_transition_to(&self, next: EventStatus) -> bool {
        matches!((self, next), (EventStatus::Open, EventStatus::Closed))
    }

    pub fn transition_to(self, next: EventStatus) -> Result<EventStatus> {
        if !self.can_transition_to(next) {
            return Err(CoreError::IllegalTransition {
                from: self.to_string(),
                to: next.to_string(),
            });
        }
        Ok(next)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "OPEN" => Ok(EventStatus::Open),
            "CLOSED" => Ok(EventStatus::Closed),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub game_id: GameId,
    /// 1-indexed number users vote with; stable for the life of the game.
    pub display_id: u32,
    pub description: String,
    pub status: EventStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTally {
    pub event: Event,
    pub votes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub game_id: GameId,
    pub user_id: UserId,
    pub grid_size: usize,
}

/// A board cell joined with the event it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSquare {
    pub row: usize,
    pub column: usize,
    pub event_id: EventId,
    pub display_id: u32,
    pub description: String,
    pub status: EventStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardView {
    pub board: Board,
    /// Ordered by row, then column.
    pub squares: Vec<BoardSquare>,
}

impl BoardView {
    /// `grid[row][col]` is true when the event on that cell is closed.
    pub fn resolved_grid(&self) -> Vec<Vec<bool>> {
        let n = self.board.grid_size;
        let mut grid = vec![vec![false; n]; n];
        for square in &self.squares {
            if square.row < n && square.column < n {
                grid[square.row][square.column] = !square.status.is_open();
            }
        }
        grid
    }

    pub fn square(&self, row: usize, column: usize) -> Option<&BoardSquare> {
        self.squares
            .iter()
            .find(|s| s.row == row && s.column == column)
    }
}

/// Everything needed to persist a game in a single transaction.
///
/// Squares reference events by display id; the store maps them to
/// storage ids once the events are inserted.
#[derive(Debug, Clone)]
pub struct NewGame {
    pub title: String,
    pub grid_size: usize,
    /// Descriptions in input order; display ids are assigned `1..=n`.
    pub events: Vec<String>,
    pub boards: Vec<NewBoard>,
}

#[derive(Debug, Clone)]
pub struct NewBoard {
    pub user_id: UserId,
    pub squares: Vec<NewSquare>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewSquare {
    pub row: usize,
    pub column: usize,
    pub display_id: u32,
}

#[derive(Debug, Clone)]
pub struct DeletedGame {
    pub game: Game,
    /// Game that became active because the deleted one was active.
    pub new_active: Option<GameId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub votes: usize,
    pub players: usize,
    pub required: usize,
    /// True only for the submission that flipped the event to closed.
    pub closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    Recorded(VoteTally),
    AlreadyVoted,
    EventClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_moves_forward() {
        assert_eq!(
            EventStatus::Open.transition_to(EventStatus::Closed).unwrap(),
            EventStatus::Closed
        );
        assert!(EventStatus::Closed.transition_to(EventStatus::Open).is_err());
        assert!(EventStatus::Closed
            .transition_to(EventStatus::Closed)
            .is_err());
        assert!(EventStatus::Open.transition_to(EventStatus::Open).is_err());
    }

    #[test]
    fn status_parses_stored_text() {
        assert_eq!("OPEN".parse::<EventStatus>().unwrap(), EventStatus::Open);
        assert_eq!(
            "CLOSED".parse::<EventStatus>().unwrap(),
            EventStatus::Closed
        );
        assert!("closed".parse::<EventStatus>().is_err());
    }

    #[test]
    fn resolved_grid_marks_closed_cells() {
        let square = |row, column, status| BoardSquare {
            row,
            column,
            event_id: (row * 2 + column) as i64,
            display_id: (row * 2 + column + 1) as u32,
            description: String::new(),
            status,
        };
        let view = BoardView {
            board: Board {
                id: 1,
                game_id: 1,
                user_id: 7,
                grid_size: 2,
            },
            squares: vec![
                square(0, 0, EventStatus::Closed),
                square(0, 1, EventStatus::Open),
                square(1, 0, EventStatus::Open),
                square(1, 1, EventStatus::Closed),
            ],
        };

        assert_eq!(
            view.resolved_grid(),
            vec![vec![true, false], vec![false, true]]
        );
        assert_eq!(view.square(1, 0).map(|s| s.display_id), Some(3));
    }
}
