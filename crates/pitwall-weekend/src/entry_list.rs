use pitwall_core::{Entrant, EntryList, RaceWeekend, RaceWeekendSession};
use tracing::{debug, instrument, warn};

use crate::error::{FilterError, Result, WeekendError};
use crate::filter::GridWindow;
use crate::sort::SortStrategy;

/// A step in building a dependent session's grid. May drop, reorder, or
/// alter entrants.
pub trait EntryListFilter: Send + Sync {
    fn name(&self) -> &str;
    fn filter(&self, entry_list: &mut EntryList) -> std::result::Result<(), FilterError>;
}

/// Build the grid for `session`.
///
/// A base session races the weekend's own entry list. Otherwise each
/// prerequisite in `inherits_ids` contributes its classified drivers, in
/// order, with pit box equal to finishing index. A prerequisite with a
/// configured grid window has it applied to its own drivers before they are
/// appended. `filters` then run in sequence over the combined list. Any
/// prerequisite without results fails the whole call.
#[instrument(skip_all, fields(race_weekend_id = %race_weekend.id, session_id = %session.id))]
pub fn get_entry_list(
    session: &RaceWeekendSession,
    race_weekend: &RaceWeekend,
    filters: &[&dyn EntryListFilter],
) -> Result<EntryList> {
    if session.is_base() {
        return Ok(race_weekend.entry_list.clone());
    }

    let strategy = SortStrategy::from_key(&session.sort_type);
    let mut entry_list = EntryList::new();

    for &parent_id in &session.inherits_ids {
        let parent = race_weekend
            .find_session(parent_id)
            .ok_or(WeekendError::EventNotFound { id: parent_id })?;
        let results = parent.results.as_ref().ok_or(WeekendError::DependencyIncomplete {
            session: session.id,
            dependency: parent_id,
        })?;

        let mut rows = results.results.clone();
        strategy.sort(results, &mut rows);

        let mut inherited = EntryList::new();
        for (position, row) in rows.iter().enumerate() {
            let Some(car) = results.find_car(&row.driver_guid, &row.car_model) else {
                warn!(
                    driver_guid = %row.driver_guid,
                    car_model = %row.car_model,
                    parent = %parent.name,
                    "no car record for classified driver; leaving them off the grid"
                );
                continue;
            };
            inherited.push(Entrant {
                driver_guid: car.driver_guid.clone(),
                driver_name: car.driver_name.clone(),
                team: car.team.clone(),
                car_model: car.model.clone(),
                skin: car.skin.clone(),
                pit_box: position,
            });
        }

        if let Some(window) = session.grid_filters.get(&parent_id) {
            apply(&GridWindow::new(window.clone()), &mut inherited)?;
        }
        entry_list.extend(inherited);
    }

    for filter in filters {
        apply(*filter, &mut entry_list)?;
    }

    debug!(entrants = entry_list.len(), sort = strategy.key(), "entry list resolved");
    Ok(entry_list)
}

fn apply(filter: &dyn EntryListFilter, entry_list: &mut EntryList) -> Result<()> {
    filter.filter(entry_list).map_err(|source| WeekendError::Filter {
        name: filter.name().to_string(),
        source,
    })
}
