use bingo_core::{BingoConfig, EventStatus, GameId, SqliteStore};
use bingo_engine::{EngineConfig, EngineError, ErrorKind, GameManager, GameRequest};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use tempfile::tempdir;

fn events(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("event {}", i)).collect()
}

async fn create(manager: &GameManager<SqliteStore>, title: &str, players: Vec<i64>) -> GameId {
    let mut rng = StdRng::seed_from_u64(title.len() as u64);
    manager
        .create_game_with_rng(GameRequest::new(title, 3, players, events(10)), &mut rng)
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_two_player_game_end_to_end() {
    let temp_dir = tempdir().unwrap();
    let store = SqliteStore::new(&temp_dir.path().join("bingo.db"), &BingoConfig::default())
        .await
        .unwrap();
    let manager = GameManager::new(Arc::new(store));

    let game_id = create(&manager, "end to end", vec![100, 200]).await;
    assert_eq!(manager.active_game().await.unwrap().unwrap().id, game_id);

    // Every event reaches some board before any is reused
    let mut seen = std::collections::HashSet::new();
    for user in [100, 200] {
        let board = manager.get_board(None, user).await.unwrap();
        assert_eq!(board.view.squares.len(), 9);
        seen.extend(board.view.squares.iter().map(|s| s.display_id));
    }
    assert_eq!(seen.len(), 10);

    let first = manager.submit_vote(None, 4, 100).await.unwrap();
    assert_eq!((first.votes, first.required), (1, 2));
    assert!(!first.closed);

    let second = manager.submit_vote(None, 4, 200).await.unwrap();
    assert!(second.closed);
    assert_eq!(second.event.status, EventStatus::Closed);
    assert!(second.scan_failure.is_none());
    // A single closed event cannot complete a 3x3 line
    assert!(second.winners.is_empty());

    let listing = manager.list_events(None).await.unwrap();
    assert_eq!((listing.open, listing.closed), (9, 1));
    let tally = &listing.events[3];
    assert_eq!(tally.event.display_id, 4);
    assert_eq!(tally.votes, 2);
}

#[tokio::test]
async fn test_first_full_line_wins() {
    let manager = GameManager::new(Arc::new(SqliteStore::open_in_memory().await.unwrap()));
    let game_id = create(&manager, "line", vec![1]).await;

    let board = manager.get_board(Some(game_id), 1).await.unwrap();
    let row: Vec<u32> = (0..3)
        .map(|column| board.view.square(1, column).unwrap().display_id)
        .collect();

    let mut last = None;
    for display_id in row {
        last = Some(manager.submit_vote(None, display_id, 1).await.unwrap());
    }

    let report = last.unwrap();
    assert!(report.closed);
    assert_eq!(report.winners.len(), 1);
    assert_eq!(report.winners[0].user_id, 1);
    assert_eq!(report.winners[0].line, bingo_engine::Line::Row(1));

    let board = manager.get_board(None, 1).await.unwrap();
    assert_eq!(board.line, Some(bingo_engine::Line::Row(1)));
}

#[tokio::test]
async fn test_duplicate_vote_leaves_count_alone() {
    let manager = GameManager::new(Arc::new(SqliteStore::open_in_memory().await.unwrap()));
    create(&manager, "dupes", vec![1, 2, 3, 4, 5]).await;

    manager.submit_vote(None, 2, 3).await.unwrap();
    let err = manager.submit_vote(None, 2, 3).await.unwrap_err();
    assert!(matches!(err, EngineError::AlreadyVoted { .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    manager.submit_vote(None, 2, 5).await.unwrap();

    let listing = manager.list_events(None).await.unwrap();
    assert_eq!(listing.required, 3);
    assert_eq!(listing.events[1].votes, 2);
    assert_eq!(listing.voters.get(&2), Some(&vec![3, 5]));
    assert!(!listing.voters.contains_key(&1));
}

#[tokio::test]
async fn test_racing_votes_close_once() {
    let manager = GameManager::new(Arc::new(SqliteStore::open_in_memory().await.unwrap()));
    create(&manager, "race", vec![1, 2]).await;

    let (first, second) = tokio::join!(
        manager.submit_vote(None, 5, 1),
        manager.submit_vote(None, 5, 2)
    );
    let reports = [first.unwrap(), second.unwrap()];

    // Both votes count; only one submission flips the event
    assert_eq!(reports.iter().filter(|r| r.closed).count(), 1);
    assert_eq!(reports.iter().map(|r| r.votes).max(), Some(2));

    let listing = manager.list_events(None).await.unwrap();
    assert_eq!(listing.events[4].event.status, EventStatus::Closed);
    assert_eq!(listing.closed, 1);
}

#[tokio::test]
async fn test_closed_events_stay_closed() {
    let manager = GameManager::new(Arc::new(SqliteStore::open_in_memory().await.unwrap()));
    create(&manager, "monotonic", vec![1, 2, 3, 4]).await;

    // 4 players need 3 votes
    for voter in [1, 2, 3] {
        manager.submit_vote(None, 7, voter).await.unwrap();
    }

    let err = manager.submit_vote(None, 7, 4).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::EventAlreadyClosed {
            display_id: 7,
            votes: 3
        }
    ));

    let listing = manager.list_events(None).await.unwrap();
    assert_eq!(listing.events[6].event.status, EventStatus::Closed);
    assert_eq!(listing.events[6].votes, 3);
}

#[tokio::test]
async fn test_delete_active_game_promotes_lowest_id() {
    let manager = GameManager::new(Arc::new(SqliteStore::open_in_memory().await.unwrap()));
    let first = create(&manager, "first", vec![1]).await;
    let second = create(&manager, "second", vec![1]).await;
    let third = create(&manager, "third", vec![1]).await;

    manager.set_active_game(third).await.unwrap();
    manager.submit_vote(None, 1, 1).await.unwrap();

    let deleted = manager.delete_game(third).await.unwrap();
    assert_eq!(deleted.new_active, Some(first));
    assert_eq!(manager.active_game().await.unwrap().unwrap().id, first);

    let games = manager.list_games().await.unwrap();
    let ids: Vec<GameId> = games.iter().map(|g| g.game.id).collect();
    assert_eq!(ids, vec![second, first]);
    assert_eq!(games.iter().filter(|g| g.game.is_active).count(), 1);

    let err = manager.list_events(Some(third)).await.unwrap_err();
    assert!(matches!(err, EngineError::GameNotFound(id) if id == third));
}

#[tokio::test]
async fn test_operations_respect_timeout() {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let config = EngineConfig {
        operation_timeout: std::time::Duration::from_millis(50),
        ..EngineConfig::default()
    };
    let manager = GameManager::with_config(store.clone(), config);

    // Hold the connection so the call cannot make progress
    let _guard = store.get_connection().await;
    let err = manager.list_games().await.unwrap_err();

    assert!(matches!(err, EngineError::Timeout { operation: "list_games", .. }));
    assert_eq!(err.kind(), ErrorKind::Storage);
}
