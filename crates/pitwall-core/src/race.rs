use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entry::EntryList;
use crate::results::SessionType;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub name: String,
    #[serde(default)]
    pub time_minutes: u32,
    #[serde(default)]
    pub laps: u32,
}

/// What the game server is told to run: track, cars, and sessions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RaceConfig {
    pub track: String,
    #[serde(default)]
    pub track_layout: String,
    #[serde(default)]
    pub cars: Vec<String>,
    #[serde(default)]
    pub max_clients: u32,
    #[serde(default)]
    pub sessions: BTreeMap<SessionType, SessionConfig>,
}

impl RaceConfig {
    pub fn new(track: impl Into<String>) -> Self {
        Self {
            track: track.into(),
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session_type: SessionType, config: SessionConfig) -> Self {
        self.sessions.insert(session_type, config);
        self
    }
}

/// A standalone, user-defined race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRace {
    pub id: Uuid,
    pub name: String,
    pub race_config: RaceConfig,
    #[serde(default)]
    pub entry_list: EntryList,
    /// Pending start instant; `None` means not scheduled.
    #[serde(default)]
    pub scheduled: Option<DateTime<Utc>>,
    /// RFC 5545 recurrence text; `None` makes the race one-shot.
    #[serde(default)]
    pub recurrence: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CustomRace {
    pub fn new(name: impl Into<String>, race_config: RaceConfig, entry_list: EntryList) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            race_config,
            entry_list,
            scheduled: None,
            recurrence: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
