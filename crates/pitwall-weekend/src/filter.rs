use pitwall_core::{EntryList, GridFilter};

use crate::entry_list::EntryListFilter;
use crate::error::FilterError;

/// Keeps a window of one parent's inherited entrants, optionally reverses
/// its head, and renumbers pit boxes.
#[derive(Debug, Clone)]
pub struct GridWindow {
    config: GridFilter,
    name: String,
}

impl GridWindow {
    pub fn new(config: GridFilter) -> Self {
        let end = match config.result_end {
            0 => "end".to_string(),
            n => n.to_string(),
        };
        let name = format!("grid window P{}-{end}", config.result_start.max(1));
        Self { config, name }
    }
}

impl EntryListFilter for GridWindow {
    fn name(&self) -> &str {
        &self.name
    }

    fn filter(&self, entry_list: &mut EntryList) -> Result<(), FilterError> {
        let entrants = entry_list.entrants_mut();
        let len = entrants.len();
        let start = self.config.result_start.max(1);
        if start > len {
            return Err(FilterError::WindowOutOfRange { start, len });
        }
        let end = match self.config.result_end {
            0 => len,
            n => n.min(len),
        };
        if end < start {
            return Err(FilterError::EmptyWindow { start, end });
        }

        entrants.truncate(end);
        entrants.drain(..start - 1);

        let reversed = match usize::try_from(self.config.reverse) {
            Ok(n) => n.min(entrants.len()),
            Err(_) => entrants.len(),
        };
        entrants[..reversed].reverse();

        entry_list.renumber_pit_boxes(self.config.entry_list_start.saturating_sub(1));
        Ok(())
    }
}
