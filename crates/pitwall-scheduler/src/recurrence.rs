use chrono::{DateTime, Utc};
use rrule::{RRuleSet, Tz};
use tracing::{error, warn};

use crate::error::{Result, SchedulerError};

/// Number of occurrences pulled from the rule per lookup. Two is enough to
/// step past the reference instant when it is itself an occurrence.
const LOOKAHEAD: u16 = 2;

/// A parsed RFC 5545 recurrence (`DTSTART:...` plus one or more `RRULE:` lines).
#[derive(Debug, Clone)]
pub struct RecurrenceRule {
    set: RRuleSet,
}

impl RecurrenceRule {
    pub fn parse(text: &str) -> Result<Self> {
        let set: RRuleSet = text
            .trim()
            .parse()
            .map_err(|e: rrule::RRuleError| SchedulerError::InvalidRecurrence(e.to_string()))?;
        Ok(Self { set })
    }

    /// First occurrence strictly after `reference`.
    pub fn next_after(&self, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.set
            .clone()
            .after(reference.with_timezone(&Tz::UTC))
            .all(LOOKAHEAD)
            .dates
            .into_iter()
            .map(|d| d.with_timezone(&Utc))
            .find(|d| *d > reference)
    }
}

/// Next occurrence of `rule` after `start`, provided it is still after `now`.
///
/// Returns `None` when the rule does not parse, is exhausted, or its next
/// tick has already elapsed. Missed occurrences are dropped, never replayed.
pub fn find_next_recurrence(
    rule: &str,
    start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let rule = match RecurrenceRule::parse(rule) {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "could not parse recurrence rule");
            return None;
        }
    };

    let next = rule.next_after(start)?;
    if next <= now {
        warn!(%start, %next, "next recurrence is already in the past; not rescheduling");
        return None;
    }
    Some(next)
}
