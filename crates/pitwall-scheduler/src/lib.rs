//! `pitwall-scheduler`: arms future-dated events and re-arms recurring ones.
//!
//! # Overview
//!
//! Three kinds of event can be scheduled, all wrapped by [`ScheduledEvent`]:
//! standalone custom races, championship events, and race-weekend sessions.
//! The [`Scheduler`] keeps one Tokio timer per pending start (and optionally
//! one per pending reminder) keyed by event id. When a start timer fires the
//! owning manager is asked to start the event, the event's scheduled time is
//! cleared in the [`Store`](pitwall_store::Store), and, if the event carries
//! a recurrence rule, the next occurrence is persisted and armed.
//!
//! Timers are a cache. [`Scheduler::init`] rebuilds them from the store on
//! every start:
//!
//! | Persisted time | Recurrence | On init                              |
//! |----------------|------------|--------------------------------------|
//! | unset          | any        | nothing                              |
//! | future         | any        | armed as stored                      |
//! | past           | yes        | next occurrence after the stale time |
//! | past           | no         | cleared; must be started by hand     |

pub mod engine;
pub mod error;
pub mod event;
pub mod launch;
pub mod notify;
pub mod recurrence;

pub use engine::Scheduler;
pub use error::{Result, SchedulerError};
pub use event::{Schedulable, ScheduledEvent};
pub use launch::{ChampionshipManager, Managers, RaceManager, RaceWeekendManager};
pub use notify::{ChannelNotifier, LogNotifier, Notification, NotificationKind, Notifier, NotifyError};
pub use recurrence::{find_next_recurrence, RecurrenceRule};
