use chrono::{DateTime, Utc};
use pitwall_core::{Championship, ChampionshipEvent, CustomRace, RaceWeekend, RaceWeekendSession};
use pitwall_store::Store;
use uuid::Uuid;

use crate::error::{Result, SchedulerError};

/// Scheduling fields every event kind carries.
pub trait Schedulable {
    fn id(&self) -> Uuid;
    fn scheduled_time(&self) -> Option<DateTime<Utc>>;
    fn set_scheduled_time(&mut self, at: Option<DateTime<Utc>>);
    fn recurrence_rule(&self) -> Option<&str>;
    fn clear_recurrence_rule(&mut self);

    fn has_recurrence_rule(&self) -> bool {
        self.recurrence_rule().is_some_and(|r| !r.trim().is_empty())
    }
}

macro_rules! impl_schedulable {
    ($ty:ty) => {
        impl Schedulable for $ty {
            fn id(&self) -> Uuid {
                self.id
            }
            fn scheduled_time(&self) -> Option<DateTime<Utc>> {
                self.scheduled
            }
            fn set_scheduled_time(&mut self, at: Option<DateTime<Utc>>) {
                self.scheduled = at;
            }
            fn recurrence_rule(&self) -> Option<&str> {
                self.recurrence.as_deref()
            }
            fn clear_recurrence_rule(&mut self) {
                self.recurrence = None;
            }
        }
    };
}

impl_schedulable!(CustomRace);
impl_schedulable!(ChampionshipEvent);
impl_schedulable!(RaceWeekendSession);

/// A snapshot of one schedulable event plus the identity of whatever owns it.
///
/// The snapshot is what a timer carries; writes always go through
/// [`ScheduledEvent::update_in`], which re-reads the owner from the store.
#[derive(Debug, Clone)]
pub enum ScheduledEvent {
    CustomRace(CustomRace),
    ChampionshipEvent {
        championship_id: Uuid,
        championship_name: String,
        event: ChampionshipEvent,
    },
    RaceWeekendSession {
        race_weekend_id: Uuid,
        race_weekend_name: String,
        session: RaceWeekendSession,
    },
}

impl ScheduledEvent {
    /// Every event of a championship, in round order.
    pub fn championship_events(championship: &Championship) -> impl Iterator<Item = ScheduledEvent> + '_ {
        championship
            .events
            .iter()
            .map(|event| ScheduledEvent::ChampionshipEvent {
                championship_id: championship.id,
                championship_name: championship.name.clone(),
                event: event.clone(),
            })
    }

    /// Every session of a race weekend, in session order.
    pub fn race_weekend_sessions(race_weekend: &RaceWeekend) -> impl Iterator<Item = ScheduledEvent> + '_ {
        race_weekend
            .sessions
            .iter()
            .map(|session| ScheduledEvent::RaceWeekendSession {
                race_weekend_id: race_weekend.id,
                race_weekend_name: race_weekend.name.clone(),
                session: session.clone(),
            })
    }

    fn inner(&self) -> &dyn Schedulable {
        match self {
            ScheduledEvent::CustomRace(race) => race,
            ScheduledEvent::ChampionshipEvent { event, .. } => event,
            ScheduledEvent::RaceWeekendSession { session, .. } => session,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Schedulable {
        match self {
            ScheduledEvent::CustomRace(race) => race,
            ScheduledEvent::ChampionshipEvent { event, .. } => event,
            ScheduledEvent::RaceWeekendSession { session, .. } => session,
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner().id()
    }

    pub fn scheduled_time(&self) -> Option<DateTime<Utc>> {
        self.inner().scheduled_time()
    }

    pub fn recurrence_rule(&self) -> Option<&str> {
        self.inner().recurrence_rule().filter(|r| !r.trim().is_empty())
    }

    pub fn has_recurrence_rule(&self) -> bool {
        self.inner().has_recurrence_rule()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ScheduledEvent::CustomRace(_) => "custom race",
            ScheduledEvent::ChampionshipEvent { .. } => "championship event",
            ScheduledEvent::RaceWeekendSession { .. } => "race weekend session",
        }
    }

    /// Human-readable label for logs and notifications.
    pub fn name(&self) -> String {
        match self {
            ScheduledEvent::CustomRace(race) => race.name.clone(),
            ScheduledEvent::ChampionshipEvent {
                championship_name,
                event,
                ..
            } => format!("{championship_name}: {}", event.race_config.track),
            ScheduledEvent::RaceWeekendSession {
                race_weekend_name,
                session,
                ..
            } => format!("{race_weekend_name}: {}", session.name),
        }
    }

    /// Same event with the snapshot's scheduled time replaced.
    pub fn with_scheduled_time(mut self, at: DateTime<Utc>) -> Self {
        self.inner_mut().set_scheduled_time(Some(at));
        self
    }

    /// Apply `f` to this event inside its owning aggregate and persist the
    /// owner, as one store transaction. Returns the event as now stored, so
    /// callers see edits made since this snapshot was taken.
    pub fn update_in<F>(&self, store: &dyn Store, f: F) -> Result<ScheduledEvent>
    where
        F: FnOnce(&mut dyn Schedulable),
    {
        let mut f = Some(f);
        let now = Utc::now();
        match self {
            ScheduledEvent::CustomRace(race) => {
                let updated = store
                    .update_custom_race(race.id, &mut |stored: &mut CustomRace| {
                        if let Some(f) = f.take() {
                            f(stored as &mut dyn Schedulable);
                        }
                        stored.updated_at = now;
                        true
                    })?
                    .ok_or(SchedulerError::EventNotFound {
                        kind: "custom race",
                        id: race.id,
                    })?;
                Ok(ScheduledEvent::CustomRace(updated))
            }
            ScheduledEvent::ChampionshipEvent {
                championship_id,
                event,
                ..
            } => {
                let updated = store
                    .update_championship(*championship_id, &mut |championship: &mut Championship| {
                        let Some(stored) = championship.find_event_mut(event.id) else {
                            return false;
                        };
                        if let Some(f) = f.take() {
                            f(stored as &mut dyn Schedulable);
                        }
                        championship.updated_at = now;
                        true
                    })?
                    .ok_or(SchedulerError::EventNotFound {
                        kind: "championship",
                        id: *championship_id,
                    })?;
                let stored = updated
                    .find_event(event.id)
                    .cloned()
                    .ok_or(SchedulerError::EventNotFound {
                        kind: "championship event",
                        id: event.id,
                    })?;
                Ok(ScheduledEvent::ChampionshipEvent {
                    championship_id: updated.id,
                    championship_name: updated.name,
                    event: stored,
                })
            }
            ScheduledEvent::RaceWeekendSession {
                race_weekend_id,
                session,
                ..
            } => {
                let updated = store
                    .update_race_weekend(*race_weekend_id, &mut |race_weekend: &mut RaceWeekend| {
                        let Some(stored) = race_weekend.find_session_mut(session.id) else {
                            return false;
                        };
                        if let Some(f) = f.take() {
                            f(stored as &mut dyn Schedulable);
                        }
                        race_weekend.updated_at = now;
                        true
                    })?
                    .ok_or(SchedulerError::EventNotFound {
                        kind: "race weekend",
                        id: *race_weekend_id,
                    })?;
                let stored = updated
                    .find_session(session.id)
                    .cloned()
                    .ok_or(SchedulerError::EventNotFound {
                        kind: "race weekend session",
                        id: session.id,
                    })?;
                Ok(ScheduledEvent::RaceWeekendSession {
                    race_weekend_id: updated.id,
                    race_weekend_name: updated.name,
                    session: stored,
                })
            }
        }
    }
}
