use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entry::EntryList;
use crate::race::RaceConfig;
use crate::results::{ResultEntry, SessionResults, SessionType};

/// Points awarded per finishing place plus the two bonuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsScheme {
    /// `places[0]` is P1. Places beyond the list score nothing.
    pub places: Vec<f64>,
    #[serde(default)]
    pub pole_position: f64,
    #[serde(default)]
    pub best_lap: f64,
}

impl Default for PointsScheme {
    fn default() -> Self {
        Self {
            places: vec![25.0, 18.0, 15.0, 12.0, 10.0, 8.0, 6.0, 4.0, 2.0, 1.0],
            pole_position: 0.0,
            best_lap: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChampionshipSession {
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub results: Option<SessionResults>,
}

/// One round of a championship. Owned and persisted by its [`Championship`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChampionshipEvent {
    pub id: Uuid,
    pub race_config: RaceConfig,
    #[serde(default)]
    pub entry_list: EntryList,
    #[serde(default)]
    pub scheduled: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recurrence: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sessions: BTreeMap<SessionType, ChampionshipSession>,
}

impl ChampionshipEvent {
    pub fn new(race_config: RaceConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            race_config,
            entry_list: EntryList::new(),
            scheduled: None,
            recurrence: None,
            started_at: None,
            completed_at: None,
            sessions: BTreeMap::new(),
        }
    }

    /// Completed once every configured session has started and completed.
    pub fn is_completed(&self) -> bool {
        !self.race_config.sessions.is_empty()
            && self.race_config.sessions.keys().all(|kind| {
                self.sessions
                    .get(kind)
                    .is_some_and(|s| s.started_at.is_some() && s.completed_at.is_some())
            })
    }

    fn results_for(&self, kind: SessionType) -> Option<&SessionResults> {
        self.sessions.get(&kind).and_then(|s| s.results.as_ref())
    }
}

/// A driver's accumulated championship points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub driver_guid: String,
    pub driver_name: String,
    pub points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Championship {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub entrants: EntryList,
    #[serde(default)]
    pub events: Vec<ChampionshipEvent>,
    #[serde(default)]
    pub points: PointsScheme,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Championship {
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            entrants: EntryList::new(),
            events: Vec::new(),
            points: PointsScheme::default(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn find_event(&self, id: Uuid) -> Option<&ChampionshipEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    pub fn find_event_mut(&mut self, id: Uuid) -> Option<&mut ChampionshipEvent> {
        self.events.iter_mut().find(|e| e.id == id)
    }

    /// Driver standings over every completed event, leader first.
    ///
    /// Race results score place points and the best-lap bonus; the qualifying
    /// P1 scores the pole bonus. Ties are ordered by driver name.
    pub fn standings(&self) -> Vec<Standing> {
        let mut totals: HashMap<String, Standing> = HashMap::new();
        let mut award = |row: &ResultEntry, points: f64| {
            totals
                .entry(row.driver_guid.clone())
                .or_insert_with(|| Standing {
                    driver_guid: row.driver_guid.clone(),
                    driver_name: row.driver_name.clone(),
                    points: 0.0,
                })
                .points += points;
        };

        for event in self.events.iter().filter(|e| e.is_completed()) {
            if let Some(pole) = event
                .results_for(SessionType::Qualifying)
                .and_then(|q| q.results.first())
            {
                award(pole, self.points.pole_position);
            }

            if let Some(race) = event.results_for(SessionType::Race) {
                for (place, row) in race.results.iter().enumerate() {
                    award(row, self.points.places.get(place).copied().unwrap_or(0.0));
                }
                if let Some(fastest) = race.fastest_lap() {
                    award(fastest, self.points.best_lap);
                }
            }
        }

        let mut standings: Vec<Standing> = totals.into_values().collect();
        standings.sort_by(|a, b| {
            b.points
                .partial_cmp(&a.points)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.driver_name.cmp(&b.driver_name))
        });
        standings
    }
}
