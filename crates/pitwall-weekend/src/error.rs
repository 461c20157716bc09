use thiserror::Error;
use uuid::Uuid;

/// Errors from resolving a race-weekend session's entry list.
#[derive(Debug, Error)]
pub enum WeekendError {
    /// A session id referenced by `inherits_ids` is not part of the weekend.
    #[error("Race weekend session not found: {id}")]
    EventNotFound { id: Uuid },

    /// A prerequisite session has no results yet; the grid cannot be built.
    #[error("Session {session} depends on {dependency}, which has no results yet")]
    DependencyIncomplete { session: Uuid, dependency: Uuid },

    #[error("Entry list filter '{name}' failed: {source}")]
    Filter {
        name: String,
        #[source]
        source: FilterError,
    },
}

/// Failure raised by an individual [`EntryListFilter`](crate::EntryListFilter).
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("grid window starts at position {start} but only {len} entrants are available")]
    WindowOutOfRange { start: usize, len: usize },

    #[error("grid window ends at position {end}, before its start {start}")]
    EmptyWindow { start: usize, end: usize },

    #[error("{0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, WeekendError>;
