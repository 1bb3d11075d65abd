//! Number of corroborating votes needed to resolve an event.
//!
//! - up to 3 players → every player must vote
//! - more players → ceil(n × 3/5)

/// Largest group that still needs a unanimous vote.
pub const UNANIMOUS_UP_TO: usize = 3;

const SHARE_NUM: usize = 3;
const SHARE_DEN: usize = 5;

/// Votes required to close an event in a game with `player_count` boards.
///
/// ```
/// use bingo_engine::consensus_threshold;
///
/// assert_eq!(consensus_threshold(2), 2);
/// assert_eq!(consensus_threshold(4), 3);
/// assert_eq!(consensus_threshold(10), 6);
/// ```
pub const fn consensus_threshold(player_count: usize) -> usize {
    if player_count <= UNANIMOUS_UP_TO {
        return player_count;
    }
    // ceil(n * 3 / 5) = (n * 3 + 4) / 5
    (player_count * SHARE_NUM + SHARE_DEN - 1) / SHARE_DEN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_small_groups_are_unanimous() {
        assert_eq!(consensus_threshold(1), 1);
        assert_eq!(consensus_threshold(2), 2);
        assert_eq!(consensus_threshold(3), 3);
    }

    #[test]
    fn threshold_large_groups() {
        let test_cases = [
            (4, 3),  // 2.4 → 3
            (5, 3),  // 3.0 → 3
            (6, 4),  // 3.6 → 4
            (7, 5),  // 4.2 → 5
            (10, 6), // 6.0 → 6
            (11, 7), // 6.6 → 7
            (20, 12),
        ];

        for (players, expected) in test_cases {
            assert_eq!(
                consensus_threshold(players),
                expected,
                "threshold({}) should be {}",
                players,
                expected
            );
        }
    }

    #[test]
    fn threshold_never_exceeds_players() {
        for n in 1..=50 {
            let t = consensus_threshold(n);
            assert!(t >= 1 && t <= n, "threshold({}) = {}", n, t);
        }
    }

    #[test]
    fn threshold_monotonic() {
        let mut prev = 0;
        for n in 1..=50 {
            let t = consensus_threshold(n);
            assert!(t >= prev, "threshold should be monotonic");
            prev = t;
        }
    }
}
