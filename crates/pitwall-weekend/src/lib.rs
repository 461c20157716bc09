//! `pitwall-weekend`: grids for race-weekend sessions.
//!
//! A base session races the weekend's own entry list. A dependent session
//! inherits its grid from the results of the sessions listed in
//! `inherits_ids`: each parent's results are optionally re-sorted
//! ([`SortStrategy`]), turned into entrants in order and cut down by that
//! parent's [`GridWindow`], then the combined list passes through a chain of
//! [`EntryListFilter`]s.

pub mod entry_list;
pub mod error;
pub mod filter;
pub mod sort;

pub use entry_list::{get_entry_list, EntryListFilter};
pub use error::{FilterError, Result, WeekendError};
pub use filter::GridWindow;
pub use sort::SortStrategy;
