//! Bingo core - shared types, configuration and storage
//!
//! Holds the data model for games, events, boards and votes, the
//! `BingoStore` trait the engine talks to, and a SQLite implementation.

pub mod config;
pub mod error;
pub mod storage;
pub mod types;

pub use config::BingoConfig;
pub use error::{CoreError, Result};
pub use storage::{BingoStore, SqliteStore};
pub use types::{
    Board, BoardId, BoardSquare, BoardView, DeletedGame, Event, EventId, EventStatus, EventTally, Game,
    GameId, GameSummary, NewBoard, NewGame, NewSquare, UserId, VoteOutcome, VoteTally,
    MAX_GRID_SIZE, MIN_GRID_SIZE,
};

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_store_creation() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("bingo.db");
        let store = SqliteStore::new(&db_path, &BingoConfig::default())
            .await
            .unwrap();

        assert!(db_path.exists());
        assert!(store.list_games().await.unwrap().is_empty());
        assert!(store.active_game().await.unwrap().is_none());
    }
}
