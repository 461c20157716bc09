use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use pitwall_store::Store;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    error::{Result, SchedulerError},
    event::ScheduledEvent,
    launch::Managers,
    notify::Notifier,
    recurrence::find_next_recurrence,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    Start,
    Reminder,
}

/// A live timer task. `token` tells a firing task whether the map entry is
/// still its own or has been replaced by a later `schedule` call.
struct Timer {
    token: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct Timers {
    start: HashMap<Uuid, Timer>,
    reminder: HashMap<Uuid, Timer>,
}

impl Timers {
    fn map(&mut self, kind: TimerKind) -> &mut HashMap<Uuid, Timer> {
        match kind {
            TimerKind::Start => &mut self.start,
            TimerKind::Reminder => &mut self.reminder,
        }
    }

    fn stop(&mut self, kind: TimerKind, id: Uuid) -> bool {
        match self.map(kind).remove(&id) {
            Some(timer) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }
}

/// Arms Tokio timers for scheduled events and fires them through the owning
/// managers.
///
/// Always used behind an `Arc`: timer tasks hold a clone so they can clear
/// state and re-arm recurring events after firing. Must be driven from
/// inside a Tokio runtime.
pub struct Scheduler {
    store: Arc<dyn Store>,
    notifier: Arc<dyn Notifier>,
    managers: Managers,
    /// Start and reminder timers behind one lock, so a reschedule racing a
    /// firing timer cannot lose an update.
    timers: Mutex<Timers>,
    next_token: AtomicU64,
}

impl Scheduler {
    pub fn new(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>, managers: Managers) -> Arc<Self> {
        Arc::new(Self {
            store,
            notifier,
            managers,
            timers: Mutex::new(Timers::default()),
            next_token: AtomicU64::new(1),
        })
    }

    /// Rebuild timers from the store.
    ///
    /// Failing to list any aggregate is fatal; failing to re-arm a single
    /// event is logged and skipped. Soft-deleted aggregates are ignored.
    #[instrument(skip(self))]
    pub fn init(self: &Arc<Self>) -> Result<()> {
        let races = self.store.list_custom_races()?;
        let championships = self.store.list_championships()?;
        let race_weekends = self.store.list_race_weekends()?;

        let mut events: Vec<ScheduledEvent> = races
            .into_iter()
            .filter(|r| !r.is_deleted())
            .map(ScheduledEvent::CustomRace)
            .collect();
        for championship in championships.iter().filter(|c| !c.is_deleted()) {
            events.extend(ScheduledEvent::championship_events(championship));
        }
        for race_weekend in race_weekends.iter().filter(|rw| !rw.is_deleted()) {
            events.extend(ScheduledEvent::race_weekend_sessions(race_weekend));
        }

        let total = events.len();
        for event in events {
            let (id, name) = (event.id(), event.name());
            if let Err(e) = self.schedule_existing_event(event) {
                error!(event_id = %id, %name, error = %e, "could not restore scheduled event");
            }
        }

        let (starts, reminders) = self.timer_counts();
        info!(events = total, starts, reminders, "scheduler initialised");
        Ok(())
    }

    /// Recovery for one persisted event.
    fn schedule_existing_event(self: &Arc<Self>, event: ScheduledEvent) -> Result<()> {
        let Some(scheduled) = event.scheduled_time() else {
            return Ok(());
        };

        let now = Utc::now();
        if scheduled > now {
            return self.schedule(event, scheduled);
        }

        let Some(rule) = event.recurrence_rule() else {
            warn!(
                event_id = %event.id(),
                name = %event.name(),
                %scheduled,
                "scheduled start was missed while offline; clearing it, start the event manually"
            );
            return self.clear_scheduled_time(&event).map(drop);
        };

        warn!(
            event_id = %event.id(),
            name = %event.name(),
            %scheduled,
            "server was offline during a scheduled recurrence; scheduling the next one"
        );
        match find_next_recurrence(rule, scheduled, now) {
            Some(next) => {
                self.rearm(event, next);
                Ok(())
            }
            None => {
                warn!(event_id = %event.id(), "no future recurrence remains; clearing scheduled time");
                self.clear_scheduled_time(&event).map(drop)
            }
        }
    }

    /// Arm (or re-arm) the start timer for `event` at `start`.
    ///
    /// Any existing start and reminder timers for the event are stopped
    /// first. When the stored reminder lead time is set, a "scheduled"
    /// notification goes out immediately and a reminder timer is armed for
    /// `start - lead`, or straight away when that instant has already
    /// passed. Notification problems never fail the call.
    #[instrument(skip(self, event), fields(event_id = %event.id(), name = %event.name()))]
    pub fn schedule(self: &Arc<Self>, event: ScheduledEvent, start: DateTime<Utc>) -> Result<()> {
        if start.timestamp() <= 0 {
            return Err(SchedulerError::InvalidScheduleTime);
        }

        let event = event.with_scheduled_time(start);
        let id = event.id();
        let lead = match self.store.load_server_options() {
            Ok(options) => options.reminder_lead_time(),
            Err(e) => {
                warn!(error = %e, "could not load server options; skipping reminders");
                None
            }
        };

        let mut timers = self.lock_timers();
        timers.stop(TimerKind::Start, id);
        timers.stop(TimerKind::Reminder, id);

        let token = self.next_token();
        let handle = tokio::spawn(Arc::clone(self).run_start_timer(event.clone(), start, token));
        timers.start.insert(id, Timer { token, handle });

        if let Some(lead) = lead {
            self.spawn_scheduled_notification(event.clone(), start);

            let remind_at = start - lead;
            if remind_at <= Utc::now() {
                debug!(%remind_at, "reminder time already passed; sending it now");
            }
            let token = self.next_token();
            let handle = tokio::spawn(Arc::clone(self).run_reminder_timer(event, remind_at, token));
            timers.reminder.insert(id, Timer { token, handle });
        }

        info!(%start, "event scheduled");
        Ok(())
    }

    /// Stop the event's timers and clear its recurrence rule and scheduled
    /// time in the store.
    #[instrument(skip(self, event), fields(event_id = %event.id(), name = %event.name()))]
    pub fn deschedule(&self, event: &ScheduledEvent) -> Result<()> {
        let id = event.id();
        {
            let mut timers = self.lock_timers();
            if !timers.stop(TimerKind::Start, id) {
                debug!("no start timer was armed");
            }
            timers.stop(TimerKind::Reminder, id);
        }

        event.update_in(self.store.as_ref(), |e| {
            e.clear_recurrence_rule();
            e.set_scheduled_time(None);
        })?;
        info!("event descheduled");
        Ok(())
    }

    pub fn has_start_timer(&self, id: Uuid) -> bool {
        self.lock_timers().start.contains_key(&id)
    }

    pub fn has_reminder_timer(&self, id: Uuid) -> bool {
        self.lock_timers().reminder.contains_key(&id)
    }

    /// Live (start, reminder) timer counts.
    pub fn timer_counts(&self) -> (usize, usize) {
        let timers = self.lock_timers();
        (timers.start.len(), timers.reminder.len())
    }

    /// Abort every timer. Persisted scheduled times are left untouched so the
    /// next `init` re-arms them.
    pub fn shutdown(&self) {
        let mut guard = self.lock_timers();
        let timers = &mut *guard;
        let count = timers.start.len() + timers.reminder.len();
        for (_, timer) in timers.start.drain().chain(timers.reminder.drain()) {
            timer.handle.abort();
        }
        info!(timers = count, "scheduler timers stopped");
    }

    // --- private helpers ---------------------------------------------------

    fn lock_timers(&self) -> MutexGuard<'_, Timers> {
        // Map entries stay consistent even if a holder panicked mid-update.
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_token(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::Relaxed)
    }

    /// Drop the map entry for a timer that has just fired, unless a newer
    /// timer already replaced it.
    fn release(&self, kind: TimerKind, id: Uuid, token: u64) {
        let mut timers = self.lock_timers();
        let map = timers.map(kind);
        if map.get(&id).is_some_and(|t| t.token == token) {
            map.remove(&id);
        }
    }

    async fn run_start_timer(self: Arc<Self>, event: ScheduledEvent, start: DateTime<Utc>, token: u64) {
        sleep_until(start).await;
        self.release(TimerKind::Start, event.id(), token);

        info!(event_id = %event.id(), name = %event.name(), kind = event.kind(), "starting scheduled event");
        // Recurrence comes from the stored event; it may have been descheduled mid-start.
        let current = match self.start_event(&event).await {
            Ok(current) => current,
            Err(e) => {
                error!(event_id = %event.id(), name = %event.name(), error = %e, "could not start scheduled event");
                return;
            }
        };

        let Some(rule) = current.recurrence_rule() else {
            return;
        };
        match find_next_recurrence(rule, start, Utc::now()) {
            Some(next) => self.rearm(current, next),
            None => info!(event_id = %current.id(), "recurrence has no further occurrence"),
        }
    }

    async fn run_reminder_timer(self: Arc<Self>, event: ScheduledEvent, remind_at: DateTime<Utc>, token: u64) {
        sleep_until(remind_at).await;
        self.release(TimerKind::Reminder, event.id(), token);

        if let Err(e) = self.notifier.send_race_reminder_message(&event).await {
            warn!(event_id = %event.id(), error = %e, "could not send race reminder");
        }
    }

    fn spawn_scheduled_notification(&self, event: ScheduledEvent, start: DateTime<Utc>) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let Err(e) = notifier.send_race_scheduled_message(&event, start).await {
                warn!(event_id = %event.id(), error = %e, "could not send race scheduled message");
            }
        });
    }

    /// Hand the event to its owning manager, then consume its scheduled time.
    /// The recurrence rule is kept. Returns the event as stored afterwards.
    async fn start_event(&self, event: &ScheduledEvent) -> Result<ScheduledEvent> {
        match event {
            ScheduledEvent::CustomRace(race) => {
                self.managers.races.start_custom_race(race.id).await?;
            }
            ScheduledEvent::ChampionshipEvent {
                championship_id,
                event: championship_event,
                ..
            } => {
                self.managers
                    .championships
                    .start_event(*championship_id, championship_event.id)
                    .await?;
            }
            ScheduledEvent::RaceWeekendSession {
                race_weekend_id,
                session,
                ..
            } => {
                self.managers
                    .race_weekends
                    .start_session(*race_weekend_id, session.id)
                    .await?;
            }
        }
        self.clear_scheduled_time(event)
    }

    fn clear_scheduled_time(&self, event: &ScheduledEvent) -> Result<ScheduledEvent> {
        event.update_in(self.store.as_ref(), |e| e.set_scheduled_time(None))
    }

    /// Persist `next` as the event's scheduled time and arm it, provided the
    /// stored event still carries a recurrence rule. A failed write is
    /// logged and the timer armed regardless; a vanished event is not armed.
    fn rearm(self: &Arc<Self>, event: ScheduledEvent, next: DateTime<Utc>) {
        let id = event.id();
        let persisted = event.update_in(self.store.as_ref(), |e| {
            if e.has_recurrence_rule() {
                e.set_scheduled_time(Some(next));
            }
        });
        let event = match persisted {
            Ok(current) if current.has_recurrence_rule() => current,
            Ok(_) => {
                info!(event_id = %id, "recurrence rule was removed; not re-arming");
                return;
            }
            Err(SchedulerError::EventNotFound { kind, .. }) => {
                warn!(event_id = %id, kind, "event no longer exists; not re-arming");
                return;
            }
            Err(e) => {
                warn!(event_id = %id, error = %e, "could not persist next recurrence");
                event
            }
        };
        if let Err(e) = self.schedule(event, next) {
            error!(event_id = %id, error = %e, "could not schedule next recurrence");
        }
    }
}

/// Sleep until a wall-clock instant; returns at once if it has passed.
async fn sleep_until(at: DateTime<Utc>) {
    let delay = (at - Utc::now()).to_std().unwrap_or_default();
    tokio::time::sleep(delay).await;
}
