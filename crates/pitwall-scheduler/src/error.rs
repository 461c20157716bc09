use pitwall_store::StoreError;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The start time was unset (at or before the Unix epoch).
    #[error("Invalid schedule time: an event needs a start time to be scheduled")]
    InvalidScheduleTime,

    /// The event (or the aggregate that owns it) is no longer in the store.
    #[error("Scheduled event not found: {kind} {id}")]
    EventNotFound { kind: &'static str, id: Uuid },

    /// The recurrence text could not be parsed.
    #[error("Invalid recurrence rule: {0}")]
    InvalidRecurrence(String),

    /// An owning manager refused or failed to start the event.
    #[error("Failed to start {name}: {reason}")]
    Launch { name: String, reason: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
