use crate::error::Result;
use crate::types::{Event, EventId, EventStatus, EventTally, GameId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;

const EVENT_COLUMNS: &str = "event_id, game_id, display_id, description, status";

pub(crate) fn status_from_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<EventStatus> {
    let status_str: String = row.get(idx)?;
    status_str.parse().map_err(|_| {
        rusqlite::Error::InvalidColumnType(idx, "status".to_string(), rusqlite::types::Type::Text)
    })
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        game_id: row.get(1)?,
        display_id: row.get(2)?,
        description: row.get(3)?,
        status: status_from_column(row, 4)?,
    })
}

pub struct EventStore<'c> {
    conn: &'c Connection,
}

impl<'c> EventStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Inserts events with display ids `1..=n` in input order and returns
    /// a display id -> event id map.
    pub fn insert_events(
        &self,
        game_id: GameId,
        descriptions: &[String],
    ) -> Result<HashMap<u32, EventId>> {
        let mut stmt = self.conn.prepare(
            "INSERT INTO events (game_id, display_id, description, status) VALUES (?1, ?2, ?3, 'OPEN')",
        )?;

        let mut ids = HashMap::with_capacity(descriptions.len());
        for (i, description) in descriptions.iter().enumerate() {
            let display_id = (i + 1) as u32;
            stmt.execute(params![game_id, display_id, description])?;
            ids.insert(display_id, self.conn.last_insert_rowid());
        }

        Ok(ids)
    }

    pub fn get_event(&self, event_id: EventId) -> Result<Option<Event>> {
        let event = self
            .conn
            .query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE event_id = ?1"),
                params![event_id],
                event_from_row,
            )
            .optional()?;
        Ok(event)
    }

    pub fn get_by_display_id(&self, game_id: GameId, display_id: u32) -> Result<Option<Event>> {
        let event = self
            .conn
            .query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM events WHERE game_id = ?1 AND display_id = ?2"),
                params![game_id, display_id],
                event_from_row,
            )
            .optional()?;
        Ok(event)
    }

    pub fn list_with_votes(&self, game_id: GameId) -> Result<Vec<EventTally>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.event_id, e.game_id, e.display_id, e.description, e.status,
                    (SELECT COUNT(*) FROM votes v WHERE v.event_id = e.event_id)
             FROM events e WHERE e.game_id = ?1 ORDER BY e.display_id",
        )?;

        let event_iter = stmt.query_map(params![game_id], |row| {
            let votes: i64 = row.get(5)?;
            Ok(EventTally {
                event: event_from_row(row)?,
                votes: votes as usize,
            })
        })?;

        let mut events = Vec::new();
        for event in event_iter {
            events.push(event?);
        }

        Ok(events)
    }

    /// Flips `OPEN` to `CLOSED`. Returns true only if this call made the change.
    pub fn close_if_open(&self, event_id: EventId) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE events SET status = ?1 WHERE event_id = ?2 AND status = ?3",
            params![
                EventStatus::Closed.as_str(),
                event_id,
                EventStatus::Open.as_str()
            ],
        )?;
        Ok(changed == 1)
    }

    pub fn count_by_status(&self, game_id: GameId, status: EventStatus) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM events WHERE game_id = ?1 AND status = ?2",
            params![game_id, status.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn delete_for_game(&self, game_id: GameId) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM events WHERE game_id = ?1", params![game_id])?)
    }
}
