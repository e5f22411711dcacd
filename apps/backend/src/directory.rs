//! Venue/HomeGame directory seam.
//!
//! Home games are owned by an external system. The core reads host id, buy-in
//! bounds and status from here and never writes back.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::errors::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HomeGameStatus {
    Scheduled,
    Active,
    Cancelled,
    Completed,
}

impl HomeGameStatus {
    /// Cancelled and completed games accept no new deposits.
    pub fn is_closed(&self) -> bool {
        matches!(self, HomeGameStatus::Cancelled | HomeGameStatus::Completed)
    }
}

/// Read-only view of a player-hosted home game. Amounts are minor units.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeGame {
    pub id: i64,
    pub host_id: i64,
    /// Venue the game is attached to, when staff there manage its escrow.
    pub venue_id: Option<i64>,
    pub buyin_min: Option<i64>,
    pub buyin_max: Option<i64>,
    pub status: HomeGameStatus,
}

#[async_trait]
pub trait HomeGameDirectory: Send + Sync {
    async fn find_home_game(&self, id: i64) -> Result<Option<HomeGame>, DomainError>;
}

/// In-memory directory for embedding without an upstream venue service.
#[derive(Debug, Default)]
pub struct StaticHomeGameDirectory {
    games: RwLock<HashMap<i64, HomeGame>>,
}

impl StaticHomeGameDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, game: HomeGame) {
        self.games.write().insert(game.id, game);
    }

    /// Change a game's status, returning false if the game is unknown.
    pub fn set_status(&self, id: i64, status: HomeGameStatus) -> bool {
        match self.games.write().get_mut(&id) {
            Some(game) => {
                game.status = status;
                true
            }
            None => false,
        }
    }

    pub fn set_bounds(&self, id: i64, buyin_min: Option<i64>, buyin_max: Option<i64>) -> bool {
        match self.games.write().get_mut(&id) {
            Some(game) => {
                game.buyin_min = buyin_min;
                game.buyin_max = buyin_max;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl HomeGameDirectory for StaticHomeGameDirectory {
    async fn find_home_game(&self, id: i64) -> Result<Option<HomeGame>, DomainError> {
        Ok(self.games.read().get(&id).cloned())
    }
}
