//! `pitwall-core`: domain model shared by every Pitwall crate.
//!
//! The three schedulable aggregates live here:
//!
//! | Aggregate      | Schedulable unit           | Persisted as        |
//! |----------------|----------------------------|---------------------|
//! | [`CustomRace`] | the race itself            | its own document    |
//! | [`Championship`] | each [`ChampionshipEvent`] | the championship  |
//! | [`RaceWeekend`] | each [`RaceWeekendSession`] | the race weekend  |

pub mod championship;
pub mod config;
pub mod entry;
pub mod error;
pub mod options;
pub mod race;
pub mod results;
pub mod weekend;

pub use championship::{Championship, ChampionshipEvent, ChampionshipSession, PointsScheme, Standing};
pub use entry::{Entrant, EntryList};
pub use error::{CoreError, Result};
pub use options::ServerOptions;
pub use race::{CustomRace, RaceConfig, SessionConfig};
pub use results::{CarRecord, ResultEntry, SessionResults, SessionType};
pub use weekend::{GridFilter, RaceWeekend, RaceWeekendSession};
