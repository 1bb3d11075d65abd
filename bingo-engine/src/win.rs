use serde::{Deserialize, Serialize};
use std::fmt;

/// A fully resolved line on a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Line {
    Row(usize),
    Column(usize),
    /// Top-left to bottom-right.
    Diagonal,
    /// Top-right to bottom-left.
    AntiDiagonal,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Row(i) => write!(f, "row {}", i + 1),
            Line::Column(i) => write!(f, "column {}", i + 1),
            Line::Diagonal => f.write_str("diagonal"),
            Line::AntiDiagonal => f.write_str("anti-diagonal"),
        }
    }
}

/// First complete line on a square grid, checking rows, columns, the main
/// diagonal and the anti-diagonal in that order. Empty or ragged grids never win.
pub fn completed_line(grid: &[Vec<bool>]) -> Option<Line> {
    let n = grid.len();
    if n == 0 || grid.iter().any(|row| row.len() != n) {
        return None;
    }

    if let Some(i) = (0..n).find(|&i| grid[i].iter().all(|&cell| cell)) {
        return Some(Line::Row(i));
    }
    if let Some(j) = (0..n).find(|&j| (0..n).all(|i| grid[i][j])) {
        return Some(Line::Column(j));
    }
    if (0..n).all(|i| grid[i][i]) {
        return Some(Line::Diagonal);
    }
    if (0..n).all(|i| grid[i][n - 1 - i]) {
        return Some(Line::AntiDiagonal);
    }

    None
}

pub fn has_win(grid: &[Vec<bool>]) -> bool {
    completed_line(grid).is_some()
}
