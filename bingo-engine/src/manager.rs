use crate::config::EngineConfig;
use crate::consensus::consensus_threshold;
use crate::error::{EngineError, Result};
use crate::lifecycle::{plan_game, GameRequest};
use crate::voting::{self, VoteReport};
use crate::win::{completed_line, Line};
use bingo_core::{
    BingoStore, BoardView, DeletedGame, EventStatus, EventTally, Game, GameId, GameSummary, UserId,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

/// Events of one game together with the current consensus numbers.
#[derive(Debug, Clone, Serialize)]
pub struct EventListing {
    pub game: Game,
    pub events: Vec<EventTally>,
    /// Voters per display id, earliest first. Events without votes are absent.
    pub voters: BTreeMap<u32, Vec<UserId>>,
    pub players: usize,
    pub required: usize,
    pub open: usize,
    pub closed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerBoard {
    pub game: Game,
    pub view: BoardView,
    /// First completed line, if any.
    pub line: Option<Line>,
}

/// Entry point for every game operation.
///
/// Calls that take `Option<GameId>` fall back to the active game when given
/// `None`. Each call is bounded by [`EngineConfig::operation_timeout`].
pub struct GameManager<S: BingoStore> {
    store: Arc<S>,
    config: EngineConfig,
}

impl<S: BingoStore> GameManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let after = self.config.operation_timeout;
        match tokio::time::timeout(after, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("{} timed out after {:?}", operation, after);
                Err(EngineError::Timeout { operation, after })
            }
        }
    }

    async fn resolve_game(&self, game_id: Option<GameId>) -> Result<Game> {
        match game_id {
            Some(id) => self
                .store
                .game(id)
                .await?
                .ok_or(EngineError::GameNotFound(id)),
            None => self
                .store
                .active_game()
                .await?
                .ok_or(EngineError::NoActiveGame),
        }
    }

    /// Creates a game with freshly shuffled boards.
    pub async fn create_game(&self, request: GameRequest) -> Result<Game> {
        let mut rng = StdRng::from_rng(&mut rand::rng());
        self.create_game_with_rng(request, &mut rng).await
    }

    /// Same as [`create_game`](Self::create_game) with a caller-supplied
    /// random source.
    pub async fn create_game_with_rng<R: Rng>(
        &self,
        request: GameRequest,
        rng: &mut R,
    ) -> Result<Game> {
        let new_game = plan_game(&request, rng, self.config.max_fill_attempts)?;

        let game = self
            .bounded("create_game", async {
                Ok(self.store.create_game(&new_game).await?)
            })
            .await?;

        tracing::info!(
            "Created game {} '{}' ({}x{}, {} players){}",
            game.id,
            game.title,
            game.grid_size,
            game.grid_size,
            new_game.boards.len(),
            if game.is_active { ", now active" } else { "" }
        );
        Ok(game)
    }

    pub async fn set_active_game(&self, game_id: GameId) -> Result<Game> {
        let game = self
            .bounded("set_active_game", async {
                self.store
                    .set_active_game(game_id)
                    .await?
                    .ok_or(EngineError::GameNotFound(game_id))
            })
            .await?;

        tracing::info!("Game {} is now active", game.id);
        Ok(game)
    }

    pub async fn delete_game(&self, game_id: GameId) -> Result<DeletedGame> {
        let deleted = self
            .bounded("delete_game", async {
                self.store
                    .delete_game_cascade(game_id)
                    .await?
                    .ok_or(EngineError::NothingToDelete(game_id))
            })
            .await?;

        match deleted.new_active {
            Some(next) => tracing::info!("Deleted game {}, game {} is now active", game_id, next),
            None => tracing::info!("Deleted game {}", game_id),
        }
        Ok(deleted)
    }

    pub async fn list_games(&self) -> Result<Vec<GameSummary>> {
        self.bounded("list_games", async { Ok(self.store.list_games().await?) })
            .await
    }

    pub async fn active_game(&self) -> Result<Option<Game>> {
        self.bounded("active_game", async { Ok(self.store.active_game().await?) })
            .await
    }

    pub async fn game(&self, game_id: Option<GameId>) -> Result<Game> {
        self.bounded("game", self.resolve_game(game_id)).await
    }

    pub async fn list_events(&self, game_id: Option<GameId>) -> Result<EventListing> {
        self.bounded("list_events", async {
            let game = self.resolve_game(game_id).await?;
            let events = self.store.list_events(game.id).await?;

            let mut voters = BTreeMap::new();
            for tally in events.iter().filter(|tally| tally.votes > 0) {
                let ids = self.store.voters(tally.event.id).await?;
                voters.insert(tally.event.display_id, ids);
            }

            let players = self.store.count_boards(game.id).await?;
            let open = self
                .store
                .count_events_by_status(game.id, EventStatus::Open)
                .await?;
            let closed = self
                .store
                .count_events_by_status(game.id, EventStatus::Closed)
                .await?;

            Ok(EventListing {
                game,
                events,
                voters,
                players,
                required: consensus_threshold(players),
                open,
                closed,
            })
        })
        .await
    }

    pub async fn players(&self, game_id: Option<GameId>) -> Result<Vec<UserId>> {
        self.bounded("players", async {
            let game = self.resolve_game(game_id).await?;
            Ok(self.store.player_ids(game.id).await?)
        })
        .await
    }

    pub async fn get_board(&self, game_id: Option<GameId>, user_id: UserId) -> Result<PlayerBoard> {
        self.bounded("get_board", async {
            let game = self.resolve_game(game_id).await?;
            let view = self
                .store
                .board_for_user(game.id, user_id)
                .await?
                .ok_or(EngineError::BoardNotFound {
                    game_id: game.id,
                    user_id,
                })?;
            let line = completed_line(&view.resolved_grid());

            Ok(PlayerBoard { game, view, line })
        })
        .await
    }

    pub async fn submit_vote(
        &self,
        game_id: Option<GameId>,
        display_id: u32,
        voter: UserId,
    ) -> Result<VoteReport> {
        self.bounded("submit_vote", async {
            let game = self.resolve_game(game_id).await?;
            voting::submit_vote(self.store.as_ref(), game.id, display_id, voter).await
        })
        .await
    }
}
