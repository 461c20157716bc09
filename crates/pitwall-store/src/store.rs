use pitwall_core::{Championship, CustomRace, RaceWeekend, ServerOptions};
use uuid::Uuid;

use crate::error::Result;

/// Persistence gateway used by the scheduler.
///
/// Calls are synchronous and expected to be fast (embedded database).
/// `list_*` returns soft-deleted aggregates too; callers decide whether to
/// skip them.
pub trait Store: Send + Sync {
    fn list_custom_races(&self) -> Result<Vec<CustomRace>>;
    fn load_custom_race(&self, id: Uuid) -> Result<Option<CustomRace>>;
    fn upsert_custom_race(&self, race: &CustomRace) -> Result<()>;
    /// Load, modify, and save in one transaction. `f` returns whether it
    /// changed anything; nothing is written when it returns false. `None`
    /// when no such race exists.
    fn update_custom_race(&self, id: Uuid, f: &mut dyn FnMut(&mut CustomRace) -> bool) -> Result<Option<CustomRace>>;

    fn list_championships(&self) -> Result<Vec<Championship>>;
    fn load_championship(&self, id: Uuid) -> Result<Option<Championship>>;
    fn upsert_championship(&self, championship: &Championship) -> Result<()>;
    /// See [`Store::update_custom_race`].
    fn update_championship(
        &self,
        id: Uuid,
        f: &mut dyn FnMut(&mut Championship) -> bool,
    ) -> Result<Option<Championship>>;

    fn list_race_weekends(&self) -> Result<Vec<RaceWeekend>>;
    fn load_race_weekend(&self, id: Uuid) -> Result<Option<RaceWeekend>>;
    fn upsert_race_weekend(&self, race_weekend: &RaceWeekend) -> Result<()>;
    /// See [`Store::update_custom_race`].
    fn update_race_weekend(
        &self,
        id: Uuid,
        f: &mut dyn FnMut(&mut RaceWeekend) -> bool,
    ) -> Result<Option<RaceWeekend>>;

    /// Defaults when nothing has been saved yet.
    fn load_server_options(&self) -> Result<ServerOptions>;
    fn upsert_server_options(&self, options: &ServerOptions) -> Result<()>;
}
