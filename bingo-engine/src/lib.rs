//! Bingo engine - game rules on top of `bingo-core` storage
//!
//! Distributes events over player boards, tracks votes until consensus and
//! detects completed lines. [`GameManager`] is the single entry point used by
//! the command layer.

pub mod config;
pub mod consensus;
pub mod distribution;
pub mod error;
pub mod lifecycle;
pub mod manager;
pub mod voting;
pub mod win;

pub use config::EngineConfig;
pub use consensus::consensus_threshold;
pub use distribution::{distribute, Cell, DistributionError};
pub use error::{EngineError, ErrorKind, Result};
pub use lifecycle::{plan_game, GameRequest};
pub use manager::{EventListing, GameManager, PlayerBoard};
pub use voting::{find_winners, submit_vote, VoteReport, Winner};
pub use win::{completed_line, has_win, Line};
