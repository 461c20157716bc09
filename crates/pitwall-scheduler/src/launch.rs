//! Entry points the scheduler calls when a start timer fires.
//!
//! Everything downstream of "start this event" (applying configuration,
//! launching the game server, ...) belongs to the implementor.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;

#[async_trait]
pub trait RaceManager: Send + Sync {
    async fn start_custom_race(&self, race_id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait ChampionshipManager: Send + Sync {
    async fn start_event(&self, championship_id: Uuid, event_id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait RaceWeekendManager: Send + Sync {
    async fn start_session(&self, race_weekend_id: Uuid, session_id: Uuid) -> Result<()>;
}

/// The three owning managers, one per event kind.
#[derive(Clone)]
pub struct Managers {
    pub races: Arc<dyn RaceManager>,
    pub championships: Arc<dyn ChampionshipManager>,
    pub race_weekends: Arc<dyn RaceWeekendManager>,
}

impl Managers {
    /// Use one value for all three roles.
    pub fn from_shared<M>(manager: Arc<M>) -> Self
    where
        M: RaceManager + ChampionshipManager + RaceWeekendManager + 'static,
    {
        Self {
            races: manager.clone(),
            championships: manager.clone(),
            race_weekends: manager,
        }
    }
}
