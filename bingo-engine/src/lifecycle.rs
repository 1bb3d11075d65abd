//! Validation and planning for new games.
//!
//! A [`GameRequest`] is checked and turned into a [`NewGame`] bundle with
//! every board already laid out, so the store can persist it in one go.

use crate::distribution::distribute;
use crate::error::{EngineError, Result};
use bingo_core::{NewBoard, NewGame, NewSquare, UserId, MAX_GRID_SIZE, MIN_GRID_SIZE};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRequest {
    pub title: String,
    pub grid_size: usize,
    pub players: Vec<UserId>,
    pub events: Vec<String>,
}

impl GameRequest {
    pub fn new(
        title: impl Into<String>,
        grid_size: usize,
        players: Vec<UserId>,
        events: Vec<String>,
    ) -> Self {
        Self {
            title: title.into(),
            grid_size,
            players,
            events,
        }
    }
}

/// Validates `request` and distributes its events over one board per player.
///
/// Display ids follow the order of `request.events`, starting at 1. Repeated
/// player ids are collapsed, keeping the first occurrence.
pub fn plan_game<R: Rng>(
    request: &GameRequest,
    rng: &mut R,
    max_fill_attempts: usize,
) -> Result<NewGame> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(EngineError::BlankTitle);
    }

    let grid_size = request.grid_size;
    if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&grid_size) {
        return Err(EngineError::GridSizeOutOfBounds {
            size: grid_size,
            min: MIN_GRID_SIZE,
            max: MAX_GRID_SIZE,
        });
    }

    let mut seen = HashSet::new();
    let players: Vec<UserId> = request
        .players
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect();
    if players.is_empty() {
        return Err(EngineError::NoPlayers);
    }

    let events = request
        .events
        .iter()
        .enumerate()
        .map(|(i, description)| {
            let description = description.trim();
            if description.is_empty() {
                Err(EngineError::BlankEvent { position: i + 1 })
            } else {
                Ok(description.to_string())
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let need = grid_size * grid_size;
    if events.len() < need {
        return Err(EngineError::NotEnoughEvents {
            grid_size,
            need,
            have: events.len(),
        });
    }

    let display_ids: Vec<u32> = (1..=events.len() as u32).collect();
    let mut layout = distribute(&display_ids, &players, grid_size, rng, max_fill_attempts)?;

    let boards = players
        .iter()
        .map(|user_id| {
            let cells = layout.remove(user_id).ok_or_else(|| {
                EngineError::internal(format!("No board laid out for player {}", user_id))
            })?;
            Ok(NewBoard {
                user_id: *user_id,
                squares: cells
                    .into_iter()
                    .map(|cell| NewSquare {
                        row: cell.row,
                        column: cell.column,
                        display_id: cell.event,
                    })
                    .collect(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        "Planned '{}': {}x{} boards for {} players over {} events",
        title,
        grid_size,
        grid_size,
        boards.len(),
        events.len()
    );

    Ok(NewGame {
        title: title.to_string(),
        grid_size,
        events,
        boards,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn events(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("event {}", i)).collect()
    }

    fn plan(request: &GameRequest) -> Result<NewGame> {
        plan_game(request, &mut StdRng::seed_from_u64(11), 10_000)
    }

    #[test]
    fn test_plan_lays_out_every_board() {
        let request = GameRequest::new("  Friday standup ", 3, vec![1, 2], events(10));
        let game = plan(&request).unwrap();

        assert_eq!(game.title, "Friday standup");
        assert_eq!(game.events.len(), 10);
        assert_eq!(game.boards.len(), 2);
        for board in &game.boards {
            assert_eq!(board.squares.len(), 9);
            assert!(board
                .squares
                .iter()
                .all(|s| (1..=10).contains(&s.display_id)));
        }
    }

    #[test]
    fn test_duplicate_players_collapse() {
        let request = GameRequest::new("dupes", 2, vec![7, 3, 7, 3, 9], events(4));
        let game = plan(&request).unwrap();

        let players: Vec<UserId> = game.boards.iter().map(|b| b.user_id).collect();
        assert_eq!(players, vec![7, 3, 9]);
    }

    #[test]
    fn test_validation_errors() {
        let err = plan(&GameRequest::new("   ", 3, vec![1], events(9))).unwrap_err();
        assert!(matches!(err, EngineError::BlankTitle));

        for size in [0, 1, 11] {
            let err = plan(&GameRequest::new("t", size, vec![1], events(200))).unwrap_err();
            assert!(matches!(err, EngineError::GridSizeOutOfBounds { .. }));
        }

        let err = plan(&GameRequest::new("t", 3, vec![], events(9))).unwrap_err();
        assert!(matches!(err, EngineError::NoPlayers));

        let mut blank = events(9);
        blank[4] = "  ".to_string();
        let err = plan(&GameRequest::new("t", 3, vec![1], blank)).unwrap_err();
        assert!(matches!(err, EngineError::BlankEvent { position: 5 }));
    }

    #[test]
    fn test_not_enough_events_reports_shortfall() {
        let err = plan(&GameRequest::new("short", 4, vec![1, 2], events(12))).unwrap_err();
        match err {
            EngineError::NotEnoughEvents {
                grid_size,
                need,
                have,
            } => {
                assert_eq!(grid_size, 4);
                assert_eq!(need, 16);
                assert_eq!(have, 12);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_events_are_trimmed() {
        let mut padded = events(4);
        padded[0] = "  coffee spill\t".to_string();
        let game = plan(&GameRequest::new("t", 2, vec![1], padded)).unwrap();
        assert_eq!(game.events[0], "coffee spill");
    }
}
