use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entry::EntryList;
use crate::race::RaceConfig;
use crate::results::{SessionResults, SessionType};

/// Grid window applied to the entrants inherited from one parent session.
///
/// Positions are 1-based to match how results are displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridFilter {
    /// First classified position kept.
    #[serde(default = "one")]
    pub result_start: usize,
    /// Last classified position kept (inclusive). 0 keeps everyone after `result_start`.
    #[serde(default)]
    pub result_end: usize,
    /// Reverse the first N of the kept entrants; -1 reverses all of them.
    #[serde(default)]
    pub reverse: i32,
    /// Pit box the first kept entrant is placed in.
    #[serde(default = "one")]
    pub entry_list_start: usize,
}

impl Default for GridFilter {
    fn default() -> Self {
        Self {
            result_start: 1,
            result_end: 0,
            reverse: 0,
            entry_list_start: 1,
        }
    }
}

fn one() -> usize {
    1
}

/// One session of a race weekend. Owned and persisted by its [`RaceWeekend`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceWeekendSession {
    pub id: Uuid,
    pub name: String,
    pub session_type: SessionType,
    #[serde(default)]
    pub race_config: RaceConfig,
    /// Sessions whose results form this session's grid, in order.
    /// Empty means the grid is the weekend's own entry list.
    #[serde(default)]
    pub inherits_ids: Vec<Uuid>,
    /// Sort strategy key applied to inherited results.
    #[serde(default)]
    pub sort_type: String,
    /// Grid window per parent session id. A parent without one contributes
    /// its whole classification.
    #[serde(default)]
    pub grid_filters: BTreeMap<Uuid, GridFilter>,
    #[serde(default)]
    pub scheduled: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recurrence: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub results: Option<SessionResults>,
}

impl RaceWeekendSession {
    pub fn new(name: impl Into<String>, session_type: SessionType, race_config: RaceConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            session_type,
            race_config,
            inherits_ids: Vec::new(),
            sort_type: String::new(),
            grid_filters: BTreeMap::new(),
            scheduled: None,
            recurrence: None,
            started_at: None,
            completed_at: None,
            results: None,
        }
    }

    /// Builder: draw this session's grid from `parent`'s results.
    pub fn inheriting(mut self, parent: Uuid) -> Self {
        self.inherits_ids.push(parent);
        self
    }

    /// Builder: draw from `parent` through a grid window.
    pub fn inheriting_window(mut self, parent: Uuid, filter: GridFilter) -> Self {
        self.inherits_ids.push(parent);
        self.grid_filters.insert(parent, filter);
        self
    }

    pub fn is_base(&self) -> bool {
        self.inherits_ids.is_empty()
    }

    pub fn has_results(&self) -> bool {
        self.results.is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceWeekend {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub entry_list: EntryList,
    #[serde(default)]
    pub sessions: Vec<RaceWeekendSession>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl RaceWeekend {
    pub fn new(name: impl Into<String>, entry_list: EntryList) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            entry_list,
            sessions: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn find_session(&self, id: Uuid) -> Option<&RaceWeekendSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn find_session_mut(&mut self, id: Uuid) -> Option<&mut RaceWeekendSession> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// Sessions that can start now: not yet run, and every session they
    /// inherit from has recorded results.
    pub fn sessions_ready(&self) -> Vec<&RaceWeekendSession> {
        self.sessions
            .iter()
            .filter(|s| s.started_at.is_none() && !s.is_completed())
            .filter(|s| {
                s.inherits_ids
                    .iter()
                    .all(|id| self.find_session(*id).is_some_and(|p| p.has_results()))
            })
            .collect()
    }
}
