use std::fmt;

use serde::{Deserialize, Serialize};

/// Session kinds a race configuration may contain, in running order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    Booking,
    Practice,
    Qualifying,
    Race,
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionType::Booking => "booking",
            SessionType::Practice => "practice",
            SessionType::Qualifying => "qualifying",
            SessionType::Race => "race",
        };
        write!(f, "{s}")
    }
}

/// One classified driver in a session result, in finishing order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultEntry {
    pub driver_guid: String,
    pub driver_name: String,
    pub car_model: String,
    /// Best lap in milliseconds; 0 when no valid lap was set.
    #[serde(default)]
    pub best_lap_ms: u64,
    /// Total elapsed time in milliseconds.
    #[serde(default)]
    pub total_time_ms: u64,
    #[serde(default)]
    pub num_laps: u32,
    #[serde(default)]
    pub collisions: u32,
    /// Track-limit violations.
    #[serde(default)]
    pub cuts: u32,
}

/// A car as it was entered in the session that produced the results.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CarRecord {
    pub car_id: u32,
    pub driver_guid: String,
    pub driver_name: String,
    #[serde(default)]
    pub team: String,
    pub model: String,
    #[serde(default)]
    pub skin: String,
}

/// Recorded outcome of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResults {
    pub session_type: SessionType,
    #[serde(default)]
    pub track: String,
    /// Classification, P1 first.
    pub results: Vec<ResultEntry>,
    #[serde(default)]
    pub cars: Vec<CarRecord>,
}

impl SessionResults {
    pub fn is_race(&self) -> bool {
        self.session_type == SessionType::Race
    }

    /// The car a classified driver drove, matched on GUID and model.
    pub fn find_car(&self, driver_guid: &str, model: &str) -> Option<&CarRecord> {
        self.cars
            .iter()
            .find(|c| c.driver_guid == driver_guid && c.model == model)
    }

    /// The driver holding the quickest valid lap, if anyone set one.
    pub fn fastest_lap(&self) -> Option<&ResultEntry> {
        self.results
            .iter()
            .filter(|r| r.best_lap_ms > 0)
            .min_by_key(|r| r.best_lap_ms)
    }
}
