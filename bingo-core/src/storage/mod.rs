pub mod board_store;
pub mod event_store;
pub mod game_store;
pub mod vote_store;

pub use board_store::BoardStore;
pub use event_store::EventStore;
pub use game_store::GameStore;
pub use vote_store::VoteStore;

use crate::config::BingoConfig;
use crate::error::{CoreError, Result};
use crate::types::{
    BoardView, DeletedGame, Event, EventId, EventStatus, EventTally, Game, GameId, GameSummary,
    NewGame, UserId, VoteOutcome, VoteTally,
};
use async_trait::async_trait;
use rusqlite::Connection;
use std::path::Path;
use tokio::sync::Mutex;

/// Storage collaborator consumed by the game engine.
///
/// Methods that mutate more than one row (`create_game`, `set_active_game`,
/// `delete_game_cascade`, `record_vote`) are all-or-nothing.
#[async_trait]
pub trait BingoStore: Send + Sync {
    /// Persists the game, its events, boards and squares in one transaction.
    /// The new game becomes active when no other game is.
    async fn create_game(&self, new_game: &NewGame) -> Result<Game>;

    async fn game(&self, game_id: GameId) -> Result<Option<Game>>;

    async fn active_game(&self) -> Result<Option<Game>>;

    /// Newest first.
    async fn list_games(&self) -> Result<Vec<GameSummary>>;

    /// Clears the flag everywhere and sets it on `game_id`. `None` if the game
    /// does not exist, in which case nothing changes.
    async fn set_active_game(&self, game_id: GameId) -> Result<Option<Game>>;

    /// Removes squares, boards, votes, events and the game. If the game was
    /// active the lowest surviving game id becomes active.
    async fn delete_game_cascade(&self, game_id: GameId) -> Result<Option<DeletedGame>>;

    async fn event_by_display_id(&self, game_id: GameId, display_id: u32)
        -> Result<Option<Event>>;

    /// Ordered by display id.
    async fn list_events(&self, game_id: GameId) -> Result<Vec<EventTally>>;

    /// Conditional `OPEN -> CLOSED`; true only for the caller that flipped it.
    async fn close_event(&self, event_id: EventId) -> Result<bool>;

    async fn count_events_by_status(&self, game_id: GameId, status: EventStatus)
        -> Result<usize>;

    async fn board_for_user(&self, game_id: GameId, user_id: UserId)
        -> Result<Option<BoardView>>;

    async fn boards_for_game(&self, game_id: GameId) -> Result<Vec<BoardView>>;

    async fn count_boards(&self, game_id: GameId) -> Result<usize>;

    async fn player_ids(&self, game_id: GameId) -> Result<Vec<UserId>>;

    /// Records a vote and, if `threshold(player_count)` is reached, closes the
    /// event, all in one transaction.
    async fn record_vote(
        &self,
        event_id: EventId,
        voter: UserId,
        threshold: fn(usize) -> usize,
    ) -> Result<VoteOutcome>;

    async fn vote_count(&self, event_id: EventId) -> Result<usize>;

    async fn has_voted(&self, event_id: EventId, user_id: UserId) -> Result<bool>;

    /// Users who voted for the event, earliest first.
    async fn voters(&self, event_id: EventId) -> Result<Vec<UserId>>;
}

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub async fn new(db_path: &Path, config: &BingoConfig) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let conn = Connection::open(db_path)?;
        conn.busy_timeout(config.busy_timeout)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!("Opened {} (journal_mode={})", db_path.display(), mode);

        let store = Self {
            conn: Mutex::new(conn),
        };

        store.init_schema().await?;
        Ok(store)
    }

    pub async fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };

        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        conn.pragma_update(None, "foreign_keys", "ON")?;

        // Games table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS games (
                game_id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                grid_size INTEGER NOT NULL CHECK (grid_size BETWEEN 2 AND 10),
                is_active INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        // At most one active game
        conn.execute(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_games_single_active
                ON games (is_active) WHERE is_active = 1",
            [],
        )?;

        // Events table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS events (
                event_id INTEGER PRIMARY KEY AUTOINCREMENT,
                game_id INTEGER NOT NULL,
                display_id INTEGER NOT NULL,
                description TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'OPEN' CHECK (status IN ('OPEN', 'CLOSED')),
                FOREIGN KEY (game_id) REFERENCES games(game_id),
                UNIQUE (game_id, display_id)
            )",
            [],
        )?;

        // Boards table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS boards (
                board_id INTEGER PRIMARY KEY AUTOINCREMENT,
                game_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                grid_size INTEGER NOT NULL,
                FOREIGN KEY (game_id) REFERENCES games(game_id),
                UNIQUE (game_id, user_id)
            )",
            [],
        )?;

        // Board squares table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS board_squares (
                board_id INTEGER NOT NULL,
                grid_row INTEGER NOT NULL,
                grid_col INTEGER NOT NULL,
                event_id INTEGER NOT NULL,
                FOREIGN KEY (board_id) REFERENCES boards(board_id),
                FOREIGN KEY (event_id) REFERENCES events(event_id),
                PRIMARY KEY (board_id, grid_row, grid_col),
                UNIQUE (board_id, event_id)
            )",
            [],
        )?;

        // Votes table
        conn.execute(
            "CREATE TABLE IF NOT EXISTS votes (
                event_id INTEGER NOT NULL,
                user_id INTEGER NOT NULL,
                voted_at INTEGER NOT NULL,
                FOREIGN KEY (event_id) REFERENCES events(event_id),
                PRIMARY KEY (event_id, user_id)
            )",
            [],
        )?;

        Ok(())
    }

    pub async fn get_connection(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }

    /// Runs `f` inside a transaction; any error rolls the whole unit back.
    async fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        T: Send,
        F: FnOnce(&Connection) -> Result<T> + Send,
    {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

#[async_trait]
impl BingoStore for SqliteStore {
    async fn create_game(&self, new_game: &NewGame) -> Result<Game> {
        let game = self
            .with_transaction(|conn| {
                let games = GameStore::new(conn);
                let game_id = games.insert_game(&new_game.title, new_game.grid_size)?;

                let is_active = games.active_game()?.is_none();
                if is_active {
                    games.mark_active(game_id)?;
                }

                let event_ids = EventStore::new(conn).insert_events(game_id, &new_game.events)?;

                let boards = BoardStore::new(conn);
                for new_board in &new_game.boards {
                    let board_id =
                        boards.insert_board(game_id, new_board.user_id, new_game.grid_size)?;

                    let squares = new_board
                        .squares
                        .iter()
                        .map(|square| {
                            let event_id =
                                event_ids.get(&square.display_id).copied().ok_or_else(|| {
                                    CoreError::internal(format!(
                                        "Square references unknown event #{}",
                                        square.display_id
                                    ))
                                })?;
                            Ok((square.row, square.column, event_id))
                        })
                        .collect::<Result<Vec<_>>>()?;

                    boards.insert_squares(board_id, &squares)?;
                }

                Ok(Game {
                    id: game_id,
                    title: new_game.title.clone(),
                    grid_size: new_game.grid_size,
                    is_active,
                })
            })
            .await?;

        tracing::info!(
            "Stored game {} with {} events and {} boards",
            game.id,
            new_game.events.len(),
            new_game.boards.len()
        );
        Ok(game)
    }

    async fn game(&self, game_id: GameId) -> Result<Option<Game>> {
        let conn = self.get_connection().await;
        GameStore::new(&conn).get_game(game_id)
    }

    async fn active_game(&self) -> Result<Option<Game>> {
        let conn = self.get_connection().await;
        GameStore::new(&conn).active_game()
    }

    async fn list_games(&self) -> Result<Vec<GameSummary>> {
        let conn = self.get_connection().await;
        GameStore::new(&conn).list_games()
    }

    async fn set_active_game(&self, game_id: GameId) -> Result<Option<Game>> {
        self.with_transaction(|conn| {
            let games = GameStore::new(conn);
            let Some(game) = games.get_game(game_id)? else {
                return Ok(None);
            };

            games.clear_active()?;
            games.mark_active(game_id)?;

            Ok(Some(Game {
                is_active: true,
                ..game
            }))
        })
        .await
    }

    async fn delete_game_cascade(&self, game_id: GameId) -> Result<Option<DeletedGame>> {
        self.with_transaction(|conn| {
            let games = GameStore::new(conn);
            let Some(game) = games.get_game(game_id)? else {
                return Ok(None);
            };

            // Delete in dependency order
            let boards = BoardStore::new(conn).delete_for_game(game_id)?;
            let votes = VoteStore::new(conn).delete_for_game(game_id)?;
            let events = EventStore::new(conn).delete_for_game(game_id)?;
            games.delete_game(game_id)?;

            let new_active = if game.is_active {
                match games.lowest_game_id()? {
                    Some(next) => {
                        games.mark_active(next)?;
                        Some(next)
                    }
                    None => None,
                }
            } else {
                None
            };

            tracing::debug!(
                "Deleted game {}: {} boards, {} votes, {} events",
                game_id,
                boards,
                votes,
                events
            );
            Ok(Some(DeletedGame { game, new_active }))
        })
        .await
    }

    async fn event_by_display_id(
        &self,
        game_id: GameId,
        display_id: u32,
    ) -> Result<Option<Event>> {
        let conn = self.get_connection().await;
        EventStore::new(&conn).get_by_display_id(game_id, display_id)
    }

    async fn list_events(&self, game_id: GameId) -> Result<Vec<EventTally>> {
        let conn = self.get_connection().await;
        EventStore::new(&conn).list_with_votes(game_id)
    }

    async fn close_event(&self, event_id: EventId) -> Result<bool> {
        let conn = self.get_connection().await;
        EventStore::new(&conn).close_if_open(event_id)
    }

    async fn count_events_by_status(
        &self,
        game_id: GameId,
        status: EventStatus,
    ) -> Result<usize> {
        let conn = self.get_connection().await;
        EventStore::new(&conn).count_by_status(game_id, status)
    }

    async fn board_for_user(
        &self,
        game_id: GameId,
        user_id: UserId,
    ) -> Result<Option<BoardView>> {
        let conn = self.get_connection().await;
        BoardStore::new(&conn).board_for_user(game_id, user_id)
    }

    async fn boards_for_game(&self, game_id: GameId) -> Result<Vec<BoardView>> {
        let conn = self.get_connection().await;
        BoardStore::new(&conn).boards_for_game(game_id)
    }

    async fn count_boards(&self, game_id: GameId) -> Result<usize> {
        let conn = self.get_connection().await;
        BoardStore::new(&conn).count_for_game(game_id)
    }

    async fn player_ids(&self, game_id: GameId) -> Result<Vec<UserId>> {
        let conn = self.get_connection().await;
        BoardStore::new(&conn).player_ids(game_id)
    }

    async fn record_vote(
        &self,
        event_id: EventId,
        voter: UserId,
        threshold: fn(usize) -> usize,
    ) -> Result<VoteOutcome> {
        self.with_transaction(|conn| {
            let events = EventStore::new(conn);
            let votes = VoteStore::new(conn);

            let event = events
                .get_event(event_id)?
                .ok_or_else(|| CoreError::internal(format!("Event {} not found", event_id)))?;

            if !event.status.is_open() {
                return Ok(VoteOutcome::EventClosed);
            }
            if votes.has_voted(event_id, voter)? {
                return Ok(VoteOutcome::AlreadyVoted);
            }

            match votes.insert_vote(event_id, voter) {
                Ok(()) => {}
                Err(e) if e.is_constraint_violation() => return Ok(VoteOutcome::AlreadyVoted),
                Err(e) => return Err(e),
            }

            let count = votes.count_for_event(event_id)?;
            let players = BoardStore::new(conn).count_for_game(event.game_id)?;
            let required = threshold(players);
            let closed = count >= required && events.close_if_open(event_id)?;

            Ok(VoteOutcome::Recorded(VoteTally {
                votes: count,
                players,
                required,
                closed,
            }))
        })
        .await
    }

    async fn vote_count(&self, event_id: EventId) -> Result<usize> {
        let conn = self.get_connection().await;
        VoteStore::new(&conn).count_for_event(event_id)
    }

    async fn has_voted(&self, event_id: EventId, user_id: UserId) -> Result<bool> {
        let conn = self.get_connection().await;
        VoteStore::new(&conn).has_voted(event_id, user_id)
    }

    async fn voters(&self, event_id: EventId) -> Result<Vec<UserId>> {
        let conn = self.get_connection().await;
        VoteStore::new(&conn).voters_for_event(event_id)
    }
}
