//! Assigns events from a shared pool to every player's board.
//!
//! Distribution runs in two passes:
//!
//! 1. **Coverage**: each event in the pool is handed, round robin, to the next
//!    player whose board still has room and does not already hold it. Every
//!    event lands somewhere before anything is used twice.
//! 2. **Fill**: boards still short of `grid_size²` cells draw random events
//!    from the whole pool, rejecting duplicates on the same board.
//!
//! When the pool is larger than the total number of cells it is shuffled
//! first so events at the front of the caller's list are not favoured.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DistributionError {
    #[error("Grid size must be at least 1")]
    InvalidGridSize,

    #[error("No players to distribute to")]
    NoPlayers,

    #[error("Pool has {have} distinct events, one board needs {need}")]
    PoolTooSmall { need: usize, have: usize },

    #[error("Board {board} still has {missing} empty cells after {attempts} rejected draws")]
    Unsatisfiable {
        board: usize,
        missing: usize,
        attempts: usize,
    },
}

/// One filled cell of a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell<T> {
    pub row: usize,
    pub column: usize,
    pub event: T,
}

struct BoardFill<T> {
    cells: Vec<Cell<T>>,
    seen: HashSet<T>,
    capacity: usize,
    grid_size: usize,
}

impl<T: Copy + Eq + Hash> BoardFill<T> {
    fn new(grid_size: usize) -> Self {
        let capacity = grid_size * grid_size;
        Self {
            cells: Vec::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            capacity,
            grid_size,
        }
    }

    fn is_full(&self) -> bool {
        self.cells.len() >= self.capacity
    }

    fn contains(&self, event: &T) -> bool {
        self.seen.contains(event)
    }

    /// Places `event` at the next row-major position.
    fn place(&mut self, event: T) {
        let filled = self.cells.len();
        self.cells.push(Cell {
            row: filled / self.grid_size,
            column: filled % self.grid_size,
            event,
        });
        self.seen.insert(event);
    }
}

/// Distributes `events` over one `grid_size × grid_size` board per player.
///
/// Every returned board has exactly `grid_size²` cells at unique positions
/// with no event repeated on the same board. `max_fill_attempts` bounds the
/// number of consecutive rejected draws per board in the fill pass.
///
/// The result is deterministic for a given `rng` state.
pub fn distribute<P, T, R>(
    events: &[T],
    players: &[P],
    grid_size: usize,
    rng: &mut R,
    max_fill_attempts: usize,
) -> Result<HashMap<P, Vec<Cell<T>>>, DistributionError>
where
    P: Copy + Eq + Hash,
    T: Copy + Eq + Hash,
    R: Rng,
{
    if grid_size == 0 {
        return Err(DistributionError::InvalidGridSize);
    }
    if players.is_empty() {
        return Err(DistributionError::NoPlayers);
    }

    let cells_per_board = grid_size * grid_size;
    let distinct = events.iter().collect::<HashSet<_>>().len();
    if distinct < cells_per_board {
        return Err(DistributionError::PoolTooSmall {
            need: cells_per_board,
            have: distinct,
        });
    }

    let mut pool = events.to_vec();
    if pool.len() > cells_per_board * players.len() {
        pool.shuffle(rng);
    }

    let mut boards: Vec<BoardFill<T>> = players.iter().map(|_| BoardFill::new(grid_size)).collect();

    coverage_pass(&pool, &mut boards);

    for (index, board) in boards.iter_mut().enumerate() {
        fill_board(board, index, &pool, rng, max_fill_attempts)?;
    }

    Ok(players
        .iter()
        .copied()
        .zip(boards.into_iter().map(|b| b.cells))
        .collect())
}

fn coverage_pass<T: Copy + Eq + Hash>(pool: &[T], boards: &mut [BoardFill<T>]) {
    let mut cursor = 0;
    let mut full = 0;

    for &event in pool {
        if full == boards.len() {
            break;
        }

        for step in 0..boards.len() {
            let index = (cursor + step) % boards.len();
            let board = &mut boards[index];
            if board.is_full() || board.contains(&event) {
                continue;
            }

            board.place(event);
            if board.is_full() {
                full += 1;
            }
            cursor = (index + 1) % boards.len();
            break;
        }
    }
}

fn fill_board<T, R>(
    board: &mut BoardFill<T>,
    index: usize,
    pool: &[T],
    rng: &mut R,
    max_fill_attempts: usize,
) -> Result<(), DistributionError>
where
    T: Copy + Eq + Hash,
    R: Rng,
{
    let mut rejected = 0;
    while !board.is_full() {
        let event = pool[rng.random_range(0..pool.len())];
        if board.contains(&event) {
            rejected += 1;
            if rejected >= max_fill_attempts {
                return Err(DistributionError::Unsatisfiable {
                    board: index,
                    missing: board.capacity - board.cells.len(),
                    attempts: rejected,
                });
            }
            continue;
        }

        board.place(event);
        rejected = 0;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const ATTEMPTS: usize = 10_000;

    fn assert_well_formed<T: Copy + Eq + Hash + std::fmt::Debug>(cells: &[Cell<T>], grid_size: usize) {
        assert_eq!(cells.len(), grid_size * grid_size);

        let positions: HashSet<(usize, usize)> = cells.iter().map(|c| (c.row, c.column)).collect();
        assert_eq!(positions.len(), cells.len(), "duplicate position");
        assert!(cells.iter().all(|c| c.row < grid_size && c.column < grid_size));

        let events: HashSet<T> = cells.iter().map(|c| c.event).collect();
        assert_eq!(events.len(), cells.len(), "duplicate event on one board: {:?}", cells);
    }

    #[test]
    fn test_full_pool_gives_disjoint_boards() {
        let mut rng = StdRng::seed_from_u64(7);
        let events: Vec<u32> = (1..=50).collect();
        let players = [1i64, 2, 3];

        let boards = distribute(&events, &players, 4, &mut rng, ATTEMPTS).unwrap();
        assert_eq!(boards.len(), 3);
        for cells in boards.values() {
            assert_well_formed(cells, 4);
        }

        // 48 cells, 50 events: coverage alone fills every board, so no reuse
        let mut used: Vec<u32> = boards.values().flatten().map(|c| c.event).collect();
        let total = used.len();
        used.sort_unstable();
        used.dedup();
        assert_eq!(used.len(), total);
    }

    #[test]
    fn test_coverage_for_various_sizes() {
        for grid_size in 1..=10 {
            for player_count in [1usize, 2, 5] {
                let mut rng = StdRng::seed_from_u64((grid_size * 31 + player_count) as u64);
                let cells = grid_size * grid_size;
                let events: Vec<usize> = (0..cells * player_count + 3).collect();
                let players: Vec<usize> = (0..player_count).collect();

                let boards = distribute(&events, &players, grid_size, &mut rng, ATTEMPTS).unwrap();
                assert_eq!(boards.len(), player_count);
                for cells in boards.values() {
                    assert_well_formed(cells, grid_size);
                }
            }
        }
    }

    #[test]
    fn test_every_event_used_before_reuse() {
        // grid² <= pool < grid² * players
        for pool_size in [9usize, 10, 14, 20, 26] {
            let mut rng = StdRng::seed_from_u64(pool_size as u64);
            let events: Vec<usize> = (0..pool_size).collect();
            let players = [10u8, 20, 30];

            let boards = distribute(&events, &players, 3, &mut rng, ATTEMPTS).unwrap();

            let mut counts: HashMap<usize, usize> = HashMap::new();
            for cells in boards.values() {
                assert_well_formed(cells, 3);
                for cell in cells {
                    *counts.entry(cell.event).or_default() += 1;
                }
            }

            assert_eq!(counts.len(), pool_size, "pool {} left events unused", pool_size);
        }
    }

    #[test]
    fn test_coverage_spreads_round_robin() {
        let mut rng = StdRng::seed_from_u64(1);
        let events: Vec<u32> = (1..=8).collect();
        let players = ['a', 'b'];

        let boards = distribute(&events, &players, 2, &mut rng, ATTEMPTS).unwrap();

        // Pool fits exactly, so no shuffle: events alternate between players
        let a: Vec<u32> = boards[&'a'].iter().map(|c| c.event).collect();
        let b: Vec<u32> = boards[&'b'].iter().map(|c| c.event).collect();
        assert_eq!(a, vec![1, 3, 5, 7]);
        assert_eq!(b, vec![2, 4, 6, 8]);
        assert_eq!((boards[&'a'][2].row, boards[&'a'][2].column), (1, 0));
    }

    #[test]
    fn test_deterministic_with_seed() {
        let events: Vec<u32> = (1..=40).collect();
        let players = [1, 2];

        let first = distribute(&events, &players, 3, &mut StdRng::seed_from_u64(99), ATTEMPTS).unwrap();
        let second = distribute(&events, &players, 3, &mut StdRng::seed_from_u64(99), ATTEMPTS).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejects_small_pool() {
        let mut rng = StdRng::seed_from_u64(3);
        let events = [1, 2, 3, 3, 4, 5, 6, 7, 8, 8];

        let err = distribute(&events, &[1], 3, &mut rng, ATTEMPTS).unwrap_err();
        assert_eq!(err, DistributionError::PoolTooSmall { need: 9, have: 8 });
    }

    #[test]
    fn test_rejects_degenerate_input() {
        let mut rng = StdRng::seed_from_u64(3);
        let events = [1, 2, 3, 4];
        let no_players: [i64; 0] = [];

        assert_eq!(
            distribute(&events, &no_players, 2, &mut rng, ATTEMPTS).unwrap_err(),
            DistributionError::NoPlayers
        );
        assert_eq!(
            distribute(&events, &[1], 0, &mut rng, ATTEMPTS).unwrap_err(),
            DistributionError::InvalidGridSize
        );
    }

    #[test]
    fn test_fill_pass_is_bounded() {
        // One board's worth of events and a single allowed rejection. Each board
        // leaves coverage with 4-5 cells and has to draw the rest, so the fill
        // pass gives up on the first collision.
        let events: Vec<u32> = (1..=9).collect();
        let players = [1, 2];

        let result = distribute(&events, &players, 3, &mut StdRng::seed_from_u64(5), 1);
        match result {
            Err(DistributionError::Unsatisfiable { missing, attempts, .. }) => {
                assert!(missing > 0);
                assert_eq!(attempts, 1);
            }
            Ok(boards) => {
                // A lucky draw sequence is still a valid distribution
                for cells in boards.values() {
                    assert_well_formed(cells, 3);
                }
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}
