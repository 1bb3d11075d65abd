use crate::error::Result;
use crate::types::{Game, GameId, GameSummary};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};

const GAME_COLUMNS: &str = "game_id, title, grid_size, is_active";

fn game_from_row(row: &Row<'_>) -> rusqlite::Result<Game> {
    let grid_size: i64 = row.get(2)?;
    Ok(Game {
        id: row.get(0)?,
        title: row.get(1)?,
        grid_size: grid_size as usize,
        is_active: row.get(3)?,
    })
}

pub struct GameStore<'c> {
    conn: &'c Connection,
}

impl<'c> GameStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert_game(&self, title: &str, grid_size: usize) -> Result<GameId> {
        self.conn.execute(
            "INSERT INTO games (title, grid_size, is_active, created_at) VALUES (?1, ?2, 0, ?3)",
            params![title, grid_size as i64, Utc::now().timestamp()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_game(&self, game_id: GameId) -> Result<Option<Game>> {
        let game = self
            .conn
            .query_row(
                &format!("SELECT {GAME_COLUMNS} FROM games WHERE game_id = ?1"),
                params![game_id],
                game_from_row,
            )
            .optional()?;
        Ok(game)
    }

    pub fn active_game(&self) -> Result<Option<Game>> {
        let game = self
            .conn
            .query_row(
                &format!("SELECT {GAME_COLUMNS} FROM games WHERE is_active = 1"),
                [],
                game_from_row,
            )
            .optional()?;
        Ok(game)
    }

    pub fn list_games(&self) -> Result<Vec<GameSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT g.game_id, g.title, g.grid_size, g.is_active,
                    (SELECT COUNT(*) FROM boards b WHERE b.game_id = g.game_id),
                    (SELECT COUNT(*) FROM events e WHERE e.game_id = g.game_id AND e.status = 'OPEN'),
                    (SELECT COUNT(*) FROM events e WHERE e.game_id = g.game_id AND e.status = 'CLOSED')
             FROM games g ORDER BY g.game_id DESC",
        )?;

        let game_iter = stmt.query_map([], |row| {
            let players: i64 = row.get(4)?;
            let open_events: i64 = row.get(5)?;
            let closed_events: i64 = row.get(6)?;
            Ok(GameSummary {
                game: game_from_row(row)?,
                players: players as usize,
                open_events: open_events as usize,
                closed_events: closed_events as usize,
            })
        })?;

        let mut games = Vec::new();
        for game in game_iter {
            games.push(game?);
        }

        Ok(games)
    }

    pub fn clear_active(&self) -> Result<()> {
        self.conn
            .execute("UPDATE games SET is_active = 0 WHERE is_active = 1", [])?;
        Ok(())
    }

    /// Returns false when the game does not exist.
    pub fn mark_active(&self, game_id: GameId) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE games SET is_active = 1 WHERE game_id = ?1",
            params![game_id],
        )?;
        Ok(changed == 1)
    }

    pub fn lowest_game_id(&self) -> Result<Option<GameId>> {
        let id = self
            .conn
            .query_row("SELECT MIN(game_id) FROM games", [], |row| {
                row.get::<_, Option<GameId>>(0)
            })?;
        Ok(id)
    }

    pub fn delete_game(&self, game_id: GameId) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM games WHERE game_id = ?1", params![game_id])?;
        Ok(changed == 1)
    }
}
