use crate::error::Result;
use crate::types::{EventId, GameId, UserId};
use chrono::Utc;
use rusqlite::{params, Connection};

pub struct VoteStore<'c> {
    conn: &'c Connection,
}

impl<'c> VoteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Fails with a constraint violation if the user already voted.
    pub fn insert_vote(&self, event_id: EventId, user_id: UserId) -> Result<()> {
        self.conn.execute(
            "INSERT INTO votes (event_id, user_id, voted_at) VALUES (?1, ?2, ?3)",
            params![event_id, user_id, Utc::now().timestamp()],
        )?;
        Ok(())
    }

    pub fn count_for_event(&self, event_id: EventId) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM votes WHERE event_id = ?1",
            params![event_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn has_voted(&self, event_id: EventId, user_id: UserId) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM votes WHERE event_id = ?1 AND user_id = ?2",
            params![event_id, user_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Voters in the order their votes arrived.
    pub fn voters_for_event(&self, event_id: EventId) -> Result<Vec<UserId>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id FROM votes WHERE event_id = ?1 ORDER BY voted_at, rowid",
        )?;

        let voter_iter = stmt.query_map(params![event_id], |row| row.get::<_, UserId>(0))?;

        let mut voters = Vec::new();
        for voter in voter_iter {
            voters.push(voter?);
        }

        Ok(voters)
    }

    pub fn delete_for_game(&self, game_id: GameId) -> Result<usize> {
        Ok(self.conn.execute(
            "DELETE FROM votes WHERE event_id IN (SELECT event_id FROM events WHERE game_id = ?1)",
            params![game_id],
        )?)
    }
}
