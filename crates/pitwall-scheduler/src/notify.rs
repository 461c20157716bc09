use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::event::ScheduledEvent;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification channel closed")]
    ChannelClosed,

    /// The queue is at capacity; the message was dropped.
    #[error("notification channel full")]
    ChannelFull,

    /// Raised by transports that deliver outside the process (webhooks,
    /// chat bots) when the remote end rejects or drops a message.
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}

/// Outbound messages about scheduled events.
///
/// The scheduler never waits on delivery outcome: errors are logged by the
/// caller and scheduling proceeds regardless.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_race_scheduled_message(
        &self,
        event: &ScheduledEvent,
        start: DateTime<Utc>,
    ) -> Result<(), NotifyError>;

    async fn send_race_reminder_message(&self, event: &ScheduledEvent) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Scheduled,
    Reminder,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub event_id: Uuid,
    pub name: String,
    pub start: Option<DateTime<Utc>>,
}

impl Notification {
    fn new(kind: NotificationKind, event: &ScheduledEvent, start: Option<DateTime<Utc>>) -> Self {
        Self {
            kind,
            event_id: event.id(),
            name: event.name(),
            start,
        }
    }
}

/// Hands notifications to a consumer task over a bounded mpsc channel.
///
/// Uses `try_send`, so a slow consumer drops messages instead of stalling
/// timer callbacks.
pub struct ChannelNotifier {
    tx: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::Sender<Notification>) -> Self {
        Self { tx }
    }

    fn push(&self, notification: Notification) -> Result<(), NotifyError> {
        self.tx.try_send(notification).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => NotifyError::ChannelFull,
            mpsc::error::TrySendError::Closed(_) => NotifyError::ChannelClosed,
        })
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn send_race_scheduled_message(
        &self,
        event: &ScheduledEvent,
        start: DateTime<Utc>,
    ) -> Result<(), NotifyError> {
        self.push(Notification::new(NotificationKind::Scheduled, event, Some(start)))
    }

    async fn send_race_reminder_message(&self, event: &ScheduledEvent) -> Result<(), NotifyError> {
        self.push(Notification::new(
            NotificationKind::Reminder,
            event,
            event.scheduled_time(),
        ))
    }
}

/// Writes notifications to the log only.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_race_scheduled_message(
        &self,
        event: &ScheduledEvent,
        start: DateTime<Utc>,
    ) -> Result<(), NotifyError> {
        info!(event_id = %event.id(), name = %event.name(), %start, "race scheduled");
        Ok(())
    }

    async fn send_race_reminder_message(&self, event: &ScheduledEvent) -> Result<(), NotifyError> {
        info!(event_id = %event.id(), name = %event.name(), "race reminder");
        Ok(())
    }
}
