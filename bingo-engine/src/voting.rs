use crate::consensus::consensus_threshold;
use crate::error::{EngineError, Result};
use crate::win::{completed_line, Line};
use bingo_core::{BingoStore, Event, EventStatus, GameId, UserId, VoteOutcome};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Winner {
    pub user_id: UserId,
    pub line: Line,
}

/// Result of one accepted vote.
#[derive(Debug, Clone, Serialize)]
pub struct VoteReport {
    pub event: Event,
    pub votes: usize,
    pub required: usize,
    /// True when this vote resolved the event.
    pub closed: bool,
    /// Boards holding a completed line right after the close.
    pub winners: Vec<Winner>,
    /// Set when the close was committed but the winner scan failed.
    pub scan_failure: Option<String>,
}

impl VoteReport {
    pub fn remaining(&self) -> usize {
        self.required.saturating_sub(self.votes)
    }
}

/// Records `voter`'s vote for event `display_id` of `game_id`, closing the
/// event once consensus is reached and then scanning for winners.
pub async fn submit_vote<S: BingoStore + ?Sized>(
    store: &S,
    game_id: GameId,
    display_id: u32,
    voter: UserId,
) -> Result<VoteReport> {
    let mut event = store
        .event_by_display_id(game_id, display_id)
        .await?
        .ok_or(EngineError::EventNotFound {
            game_id,
            display_id,
        })?;

    if !event.status.is_open() {
        let votes = store.vote_count(event.id).await?;
        return Err(EngineError::EventAlreadyClosed { display_id, votes });
    }
    if store.has_voted(event.id, voter).await? {
        return Err(EngineError::AlreadyVoted { display_id, voter });
    }
    if store.count_boards(game_id).await? == 0 {
        return Err(EngineError::internal(format!(
            "Game {} has no boards",
            game_id
        )));
    }

    let tally = match store
        .record_vote(event.id, voter, consensus_threshold)
        .await?
    {
        VoteOutcome::Recorded(tally) => tally,
        VoteOutcome::AlreadyVoted => return Err(EngineError::AlreadyVoted { display_id, voter }),
        VoteOutcome::EventClosed => {
            let votes = store.vote_count(event.id).await?;
            return Err(EngineError::EventAlreadyClosed { display_id, votes });
        }
    };

    tracing::info!(
        "Vote from {} on game {} event #{}: {}/{}",
        voter,
        game_id,
        display_id,
        tally.votes,
        tally.required
    );

    let mut report = VoteReport {
        event: event.clone(),
        votes: tally.votes,
        required: tally.required,
        closed: tally.closed,
        winners: Vec::new(),
        scan_failure: None,
    };

    if !tally.closed {
        return Ok(report);
    }

    event.status = event.status.transition_to(EventStatus::Closed)?;
    report.event = event;
    tracing::info!("Event #{} in game {} closed", display_id, game_id);

    match find_winners(store, game_id).await {
        Ok(winners) => {
            for winner in &winners {
                tracing::info!(
                    "Player {} completed {} in game {}",
                    winner.user_id,
                    winner.line,
                    game_id
                );
            }
            report.winners = winners;
        }
        Err(e) => {
            tracing::error!("Winner scan for game {} failed: {}", game_id, e);
            report.scan_failure = Some(e.to_string());
        }
    }

    Ok(report)
}

/// Every board in the game that currently holds a completed line.
pub async fn find_winners<S: BingoStore + ?Sized>(
    store: &S,
    game_id: GameId,
) -> Result<Vec<Winner>> {
    let boards = store.boards_for_game(game_id).await?;

    Ok(boards
        .iter()
        .filter_map(|view| {
            completed_line(&view.resolved_grid()).map(|line| Winner {
                user_id: view.board.user_id,
                line,
            })
        })
        .collect())
}
