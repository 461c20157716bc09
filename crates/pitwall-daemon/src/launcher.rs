use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use pitwall_core::{Championship, RaceWeekend};
use pitwall_scheduler::{ChampionshipManager, RaceManager, RaceWeekendManager, Result, SchedulerError};
use pitwall_store::Store;
use tracing::{info, instrument};
use uuid::Uuid;

/// Starts events by recording the start in the store.
///
/// There is no game-server process behind this daemon yet, so "starting" an
/// event means stamping `started_at` and, for race-weekend sessions, proving
/// that a grid can be built from the prerequisite results.
pub struct StoreLauncher {
    store: Arc<dyn Store>,
}

impl StoreLauncher {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RaceManager for StoreLauncher {
    #[instrument(skip(self))]
    async fn start_custom_race(&self, race_id: Uuid) -> Result<()> {
        let race = self
            .store
            .load_custom_race(race_id)?
            .ok_or(SchedulerError::EventNotFound {
                kind: "custom race",
                id: race_id,
            })?;
        info!(
            name = %race.name,
            track = %race.race_config.track,
            entrants = race.entry_list.len(),
            "custom race started"
        );
        Ok(())
    }
}

#[async_trait]
impl ChampionshipManager for StoreLauncher {
    #[instrument(skip(self))]
    async fn start_event(&self, championship_id: Uuid, event_id: Uuid) -> Result<()> {
        let now = Utc::now();
        let mut track = None;
        let championship = self
            .store
            .update_championship(championship_id, &mut |championship: &mut Championship| {
                let Some(event) = championship.find_event_mut(event_id) else {
                    return false;
                };
                event.started_at = Some(now);
                track = Some(event.race_config.track.clone());
                championship.updated_at = now;
                true
            })?
            .ok_or(SchedulerError::EventNotFound {
                kind: "championship",
                id: championship_id,
            })?;
        let track = track.ok_or(SchedulerError::EventNotFound {
            kind: "championship event",
            id: event_id,
        })?;

        info!(championship = %championship.name, %track, "championship event started");
        Ok(())
    }
}

#[async_trait]
impl RaceWeekendManager for StoreLauncher {
    #[instrument(skip(self))]
    async fn start_session(&self, race_weekend_id: Uuid, session_id: Uuid) -> Result<()> {
        let now = Utc::now();
        let mut outcome = None;
        let race_weekend = self
            .store
            .update_race_weekend(race_weekend_id, &mut |race_weekend: &mut RaceWeekend| {
                let Some(session) = race_weekend.find_session(session_id) else {
                    return false;
                };
                let grid = pitwall_weekend::get_entry_list(session, &*race_weekend, &[]).map_err(|e| {
                    SchedulerError::Launch {
                        name: format!("{}: {}", race_weekend.name, session.name),
                        reason: e.to_string(),
                    }
                });
                let resolved = grid.is_ok();
                outcome = Some(grid);
                if !resolved {
                    return false;
                }
                if let Some(session) = race_weekend.find_session_mut(session_id) {
                    session.started_at = Some(now);
                }
                race_weekend.updated_at = now;
                true
            })?
            .ok_or(SchedulerError::EventNotFound {
                kind: "race weekend",
                id: race_weekend_id,
            })?;
        let grid = outcome.ok_or(SchedulerError::EventNotFound {
            kind: "race weekend session",
            id: session_id,
        })??;

        info!(
            race_weekend = %race_weekend.name,
            grid = ?grid.guids(),
            "race weekend session started"
        );
        Ok(())
    }
}
