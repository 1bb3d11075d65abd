use crate::error::Result;
use crate::storage::event_store::status_from_column;
use crate::types::{Board, BoardId, BoardSquare, BoardView, EventId, GameId, UserId};
use rusqlite::{params, Connection, OptionalExtension, Row};

fn board_from_row(row: &Row<'_>) -> rusqlite::Result<Board> {
    let grid_size: i64 = row.get(3)?;
    Ok(Board {
        id: row.get(0)?,
        game_id: row.get(1)?,
        user_id: row.get(2)?,
        grid_size: grid_size as usize,
    })
}

pub struct BoardStore<'c> {
    conn: &'c Connection,
}

impl<'c> BoardStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert_board(&self, game_id: GameId, user_id: UserId, grid_size: usize) -> Result<BoardId> {
        self.conn.execute(
            "INSERT INTO boards (game_id, user_id, grid_size) VALUES (?1, ?2, ?3)",
            params![game_id, user_id, grid_size as i64],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Bulk insert of `(row, column, event_id)` cells for one board.
    pub fn insert_squares(&self, board_id: BoardId, squares: &[(usize, usize, EventId)]) -> Result<()> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO board_squares (board_id, grid_row, grid_col, event_id) VALUES (?1, ?2, ?3, ?4)",
        )?;

        for &(row, column, event_id) in squares {
            stmt.execute(params![board_id, row as i64, column as i64, event_id])?;
        }

        Ok(())
    }

    pub fn board_for_user(&self, game_id: GameId, user_id: UserId) -> Result<Option<BoardView>> {
        let board = self
            .conn
            .query_row(
                "SELECT board_id, game_id, user_id, grid_size FROM boards WHERE game_id = ?1 AND user_id = ?2",
                params![game_id, user_id],
                board_from_row,
            )
            .optional()?;

        match board {
            Some(board) => {
                let squares = self.squares(board.id)?;
                Ok(Some(BoardView { board, squares }))
            }
            None => Ok(None),
        }
    }

    pub fn boards_for_game(&self, game_id: GameId) -> Result<Vec<BoardView>> {
        let mut stmt = self.conn.prepare(
            "SELECT board_id, game_id, user_id, grid_size FROM boards WHERE game_id = ?1 ORDER BY board_id",
        )?;

        let board_iter = stmt.query_map(params![game_id], board_from_row)?;

        let mut boards = Vec::new();
        for board in board_iter {
            let board = board?;
            let squares = self.squares(board.id)?;
            boards.push(BoardView { board, squares });
        }

        Ok(boards)
    }

    fn squares(&self, board_id: BoardId) -> Result<Vec<BoardSquare>> {
        let mut stmt = self.conn.prepare(
            "SELECT bs.grid_row, bs.grid_col, bs.event_id, e.display_id, e.description, e.status
             FROM board_squares bs
             JOIN events e ON bs.event_id = e.event_id
             WHERE bs.board_id = ?1
             ORDER BY bs.grid_row, bs.grid_col",
        )?;

        let square_iter = stmt.query_map(params![board_id], |row| {
            let grid_row: i64 = row.get(0)?;
            let grid_col: i64 = row.get(1)?;
            Ok(BoardSquare {
                row: grid_row as usize,
                column: grid_col as usize,
                event_id: row.get(2)?,
                display_id: row.get(3)?,
                description: row.get(4)?,
                status: status_from_column(row, 5)?,
            })
        })?;

        let mut squares = Vec::new();
        for square in square_iter {
            squares.push(square?);
        }

        Ok(squares)
    }

    pub fn count_for_game(&self, game_id: GameId) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM boards WHERE game_id = ?1",
            params![game_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn player_ids(&self, game_id: GameId) -> Result<Vec<UserId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT user_id FROM boards WHERE game_id = ?1 ORDER BY board_id")?;

        let id_iter = stmt.query_map(params![game_id], |row| row.get::<_, UserId>(0))?;

        let mut ids = Vec::new();
        for id in id_iter {
            ids.push(id?);
        }

        Ok(ids)
    }

    /// Deletes squares first, then the boards themselves.
    pub fn delete_for_game(&self, game_id: GameId) -> Result<usize> {
        self.conn.execute(
            "DELETE FROM board_squares WHERE board_id IN (SELECT board_id FROM boards WHERE game_id = ?1)",
            params![game_id],
        )?;
        Ok(self
            .conn
            .execute("DELETE FROM boards WHERE game_id = ?1", params![game_id])?)
    }
}
