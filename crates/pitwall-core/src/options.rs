use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Global server options persisted alongside the aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerOptions {
    #[serde(default = "default_name")]
    pub name: String,
    /// Lead time before an event's start at which a reminder is sent.
    /// Zero disables both the "scheduled" and "reminder" notifications.
    #[serde(default)]
    pub notification_reminder_secs: u64,
}

impl ServerOptions {
    /// The reminder lead time, or `None` when reminders are switched off.
    pub fn reminder_lead_time(&self) -> Option<Duration> {
        if self.notification_reminder_secs == 0 {
            return None;
        }
        i64::try_from(self.notification_reminder_secs)
            .ok()
            .map(Duration::seconds)
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            name: default_name(),
            notification_reminder_secs: 0,
        }
    }
}

fn default_name() -> String {
    "Pitwall".to_string()
}
