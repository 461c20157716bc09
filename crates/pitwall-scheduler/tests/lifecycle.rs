// End-to-end scheduler behaviour against an in-memory SQLite store.
// Tokio time is paused, so timers an hour out resolve instantly.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Timelike, Utc};
use pitwall_core::{
    Championship, ChampionshipEvent, CustomRace, EntryList, RaceConfig, RaceWeekend,
    RaceWeekendSession, ServerOptions, SessionType,
};
use pitwall_scheduler::{
    ChampionshipManager, Managers, Notifier, NotifyError, RaceManager, RaceWeekendManager,
    Result, ScheduledEvent, Scheduler, SchedulerError,
};
use pitwall_store::{SqliteStore, Store};
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Scheduled(Uuid),
    Reminder(Uuid),
    Started(Uuid),
}

/// Records every manager and notifier call with the (virtual) time it happened.
#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<(Call, Instant)>>,
    fail_starts: AtomicBool,
    fail_notifications: AtomicBool,
    /// How long a start takes before it is recorded.
    start_delay_secs: AtomicU64,
}

impl Recorder {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((call, Instant::now()));
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
    }

    fn starts(&self) -> Vec<Uuid> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Started(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn time_of(&self, call: &Call) -> Instant {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(c, _)| c == call)
            .map(|(_, t)| *t)
            .expect("call was not recorded")
    }

    async fn start(&self, id: Uuid) -> Result<()> {
        let delay = self.start_delay_secs.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(std::time::Duration::from_secs(delay)).await;
        }
        if self.fail_starts.load(Ordering::SeqCst) {
            return Err(SchedulerError::Launch {
                name: id.to_string(),
                reason: "server offline".to_string(),
            });
        }
        self.record(Call::Started(id));
        Ok(())
    }
}

#[async_trait]
impl RaceManager for Recorder {
    async fn start_custom_race(&self, race_id: Uuid) -> Result<()> {
        self.start(race_id).await
    }
}

#[async_trait]
impl ChampionshipManager for Recorder {
    async fn start_event(&self, _championship_id: Uuid, event_id: Uuid) -> Result<()> {
        self.start(event_id).await
    }
}

#[async_trait]
impl RaceWeekendManager for Recorder {
    async fn start_session(&self, _race_weekend_id: Uuid, session_id: Uuid) -> Result<()> {
        self.start(session_id).await
    }
}

#[async_trait]
impl Notifier for Recorder {
    async fn send_race_scheduled_message(
        &self,
        event: &ScheduledEvent,
        _start: DateTime<Utc>,
    ) -> std::result::Result<(), NotifyError> {
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery("webhook down".to_string()));
        }
        self.record(Call::Scheduled(event.id()));
        Ok(())
    }

    async fn send_race_reminder_message(
        &self,
        event: &ScheduledEvent,
    ) -> std::result::Result<(), NotifyError> {
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery("webhook down".to_string()));
        }
        self.record(Call::Reminder(event.id()));
        Ok(())
    }
}

struct Harness {
    store: Arc<SqliteStore>,
    recorder: Arc<Recorder>,
    scheduler: Arc<Scheduler>,
}

fn harness_with(store: Arc<SqliteStore>) -> Harness {
    let recorder = Arc::new(Recorder::default());
    let scheduler = Scheduler::new(
        store.clone(),
        recorder.clone(),
        Managers::from_shared(recorder.clone()),
    );
    Harness {
        store,
        recorder,
        scheduler,
    }
}

fn harness() -> Harness {
    harness_with(Arc::new(SqliteStore::open_in_memory().unwrap()))
}

fn set_reminder_lead(store: &SqliteStore, secs: u64) {
    store
        .upsert_server_options(&ServerOptions {
            notification_reminder_secs: secs,
            ..Default::default()
        })
        .unwrap();
}

fn whole_seconds(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_nanosecond(0).unwrap()
}

fn hourly_from(start: DateTime<Utc>) -> String {
    format!("DTSTART:{}\nRRULE:FREQ=HOURLY", start.format("%Y%m%dT%H%M%SZ"))
}

fn saved_race(store: &SqliteStore, scheduled: Option<DateTime<Utc>>, recurrence: Option<String>) -> CustomRace {
    let mut race = CustomRace::new("Tuesday Club Race", RaceConfig::new("silverstone"), EntryList::new());
    race.scheduled = scheduled;
    race.recurrence = recurrence;
    store.upsert_custom_race(&race).unwrap();
    race
}

async fn wait(secs: i64) {
    tokio::time::sleep(Duration::seconds(secs).to_std().unwrap()).await;
}

#[tokio::test(start_paused = true)]
async fn unset_start_time_is_rejected_without_arming() {
    let h = harness();
    let race = saved_race(&h.store, None, None);

    let err = h
        .scheduler
        .schedule(ScheduledEvent::CustomRace(race), DateTime::<Utc>::default())
        .unwrap_err();

    assert!(matches!(err, SchedulerError::InvalidScheduleTime));
    assert_eq!(h.scheduler.timer_counts(), (0, 0));
}

#[tokio::test(start_paused = true)]
async fn rescheduling_replaces_both_timers() {
    let h = harness();
    set_reminder_lead(&h.store, 60);
    let race = saved_race(&h.store, None, None);
    let id = race.id;

    let event = ScheduledEvent::CustomRace(race);
    h.scheduler.schedule(event.clone(), Utc::now() + Duration::minutes(10)).unwrap();
    h.scheduler.schedule(event, Utc::now() + Duration::minutes(20)).unwrap();
    assert_eq!(h.scheduler.timer_counts(), (1, 1));

    wait(25 * 60).await;

    assert_eq!(h.recorder.starts(), vec![id]);
    let reminders = h
        .recorder
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Reminder(_)))
        .count();
    assert_eq!(reminders, 1);
    assert_eq!(h.scheduler.timer_counts(), (0, 0));
}

#[tokio::test(start_paused = true)]
async fn scheduled_then_reminder_then_start() {
    let h = harness();
    set_reminder_lead(&h.store, 1);
    let race = saved_race(&h.store, None, None);
    let id = race.id;

    let t0 = Instant::now();
    h.scheduler
        .schedule(ScheduledEvent::CustomRace(race), Utc::now() + Duration::seconds(2))
        .unwrap();

    wait(3).await;

    assert_eq!(
        h.recorder.calls(),
        vec![Call::Scheduled(id), Call::Reminder(id), Call::Started(id)]
    );
    let reminder_at = h.recorder.time_of(&Call::Reminder(id)) - t0;
    let start_at = h.recorder.time_of(&Call::Started(id)) - t0;
    assert!(reminder_at.as_millis() >= 900 && reminder_at.as_millis() <= 1100, "{reminder_at:?}");
    assert!(start_at.as_millis() >= 1900 && start_at.as_millis() <= 2100, "{start_at:?}");

    let stored = h.store.load_custom_race(id).unwrap().unwrap();
    assert_eq!(stored.scheduled, None);
}

#[tokio::test(start_paused = true)]
async fn reminder_is_sent_at_once_when_lead_exceeds_time_left() {
    let h = harness();
    set_reminder_lead(&h.store, 60);
    let race = saved_race(&h.store, None, None);
    let id = race.id;

    h.scheduler
        .schedule(ScheduledEvent::CustomRace(race), Utc::now() + Duration::seconds(10))
        .unwrap();
    assert_eq!(h.scheduler.timer_counts(), (1, 1));

    wait(1).await;
    assert_eq!(h.recorder.calls(), vec![Call::Scheduled(id), Call::Reminder(id)]);

    wait(10).await;
    assert_eq!(h.recorder.starts(), vec![id]);
}

#[tokio::test(start_paused = true)]
async fn no_notifications_without_lead_time() {
    let h = harness();
    let race = saved_race(&h.store, None, None);
    let id = race.id;

    h.scheduler
        .schedule(ScheduledEvent::CustomRace(race), Utc::now() + Duration::seconds(2))
        .unwrap();
    assert_eq!(h.scheduler.timer_counts(), (1, 0));

    wait(3).await;
    assert_eq!(h.recorder.calls(), vec![Call::Started(id)]);
}

#[tokio::test(start_paused = true)]
async fn notification_failure_does_not_block_start() {
    let h = harness();
    set_reminder_lead(&h.store, 1);
    h.recorder.fail_notifications.store(true, Ordering::SeqCst);
    let race = saved_race(&h.store, None, None);
    let id = race.id;

    h.scheduler
        .schedule(ScheduledEvent::CustomRace(race), Utc::now() + Duration::seconds(2))
        .unwrap();
    wait(3).await;

    assert_eq!(h.recorder.starts(), vec![id]);
}

#[tokio::test(start_paused = true)]
async fn recurring_event_rearms_and_persists_next_occurrence() {
    let h = harness();
    let start = whole_seconds(Utc::now() + Duration::seconds(3));
    let race = saved_race(&h.store, Some(start), Some(hourly_from(start)));
    let id = race.id;

    h.scheduler.schedule(ScheduledEvent::CustomRace(race), start).unwrap();
    wait(4).await;

    assert_eq!(h.recorder.starts(), vec![id]);
    assert!(h.scheduler.has_start_timer(id));

    let stored = h.store.load_custom_race(id).unwrap().unwrap();
    assert_eq!(stored.scheduled, Some(start + Duration::hours(1)));
    assert!(stored.recurrence.is_some());
}

#[tokio::test(start_paused = true)]
async fn failed_start_keeps_scheduled_time_and_does_not_rearm() {
    let h = harness();
    h.recorder.fail_starts.store(true, Ordering::SeqCst);
    let start = whole_seconds(Utc::now() + Duration::seconds(3));
    let race = saved_race(&h.store, Some(start), Some(hourly_from(start)));
    let id = race.id;

    h.scheduler.schedule(ScheduledEvent::CustomRace(race), start).unwrap();
    wait(4).await;

    assert!(h.recorder.starts().is_empty());
    assert!(!h.scheduler.has_start_timer(id));
    let stored = h.store.load_custom_race(id).unwrap().unwrap();
    assert_eq!(stored.scheduled, Some(start));
}

#[tokio::test(start_paused = true)]
async fn init_clears_missed_one_shot_without_starting_it() {
    let h = harness();
    let race = saved_race(&h.store, Some(Utc::now() - Duration::minutes(5)), None);

    h.scheduler.init().unwrap();
    wait(60).await;

    assert!(h.recorder.starts().is_empty());
    assert_eq!(h.scheduler.timer_counts(), (0, 0));
    let stored = h.store.load_custom_race(race.id).unwrap().unwrap();
    assert_eq!(stored.scheduled, None);
}

#[tokio::test(start_paused = true)]
async fn init_schedules_next_recurrence_after_missed_one() {
    let h = harness();
    let stale = whole_seconds(Utc::now() - Duration::minutes(30));
    let race = saved_race(&h.store, Some(stale), Some(hourly_from(stale)));

    h.scheduler.init().unwrap();

    assert!(h.scheduler.has_start_timer(race.id));
    assert!(h.recorder.starts().is_empty());
    let stored = h.store.load_custom_race(race.id).unwrap().unwrap();
    assert_eq!(stored.scheduled, Some(stale + Duration::hours(1)));
}

#[tokio::test(start_paused = true)]
async fn init_restores_every_event_kind_and_skips_deleted() {
    let h = harness();
    let later = Utc::now() + Duration::hours(2);

    let race = saved_race(&h.store, Some(later), None);

    let mut deleted = CustomRace::new("Binned", RaceConfig::new("imola"), EntryList::new());
    deleted.scheduled = Some(later);
    deleted.deleted_at = Some(Utc::now());
    h.store.upsert_custom_race(&deleted).unwrap();

    let mut champ = Championship::new("GT3 Sprint");
    let mut round = ChampionshipEvent::new(RaceConfig::new("monza"));
    round.scheduled = Some(later);
    let round_id = round.id;
    champ.events.push(round);
    champ.events.push(ChampionshipEvent::new(RaceConfig::new("spa")));
    h.store.upsert_championship(&champ).unwrap();

    let mut weekend = RaceWeekend::new("Nordschleife Weekend", EntryList::new());
    let mut session = RaceWeekendSession::new("Race", SessionType::Race, RaceConfig::new("ks_nordschleife"));
    session.scheduled = Some(later);
    let session_id = session.id;
    weekend.sessions.push(session);
    h.store.upsert_race_weekend(&weekend).unwrap();

    h.scheduler.init().unwrap();

    assert!(h.scheduler.has_start_timer(race.id));
    assert!(h.scheduler.has_start_timer(round_id));
    assert!(h.scheduler.has_start_timer(session_id));
    assert!(!h.scheduler.has_start_timer(deleted.id));
    assert_eq!(h.scheduler.timer_counts().0, 3);

    wait(3 * 3600).await;

    let mut started = h.recorder.starts();
    started.sort();
    let mut expected = vec![race.id, round_id, session_id];
    expected.sort();
    assert_eq!(started, expected);

    let stored = h.store.load_championship(champ.id).unwrap().unwrap();
    assert_eq!(stored.find_event(round_id).unwrap().scheduled, None);
    let stored = h.store.load_race_weekend(weekend.id).unwrap().unwrap();
    assert_eq!(stored.find_session(session_id).unwrap().scheduled, None);
}

#[tokio::test(start_paused = true)]
async fn deschedule_stops_timer_and_clears_persisted_state() {
    let h = harness();
    set_reminder_lead(&h.store, 60);
    let start = whole_seconds(Utc::now() + Duration::minutes(10));
    let race = saved_race(&h.store, Some(start), Some(hourly_from(start)));
    let id = race.id;

    let event = ScheduledEvent::CustomRace(race);
    h.scheduler.schedule(event.clone(), start).unwrap();
    assert!(h.scheduler.has_start_timer(id));

    h.scheduler.deschedule(&event).unwrap();
    assert!(!h.scheduler.has_start_timer(id));

    let stored = h.store.load_custom_race(id).unwrap().unwrap();
    assert_eq!(stored.scheduled, None);
    assert_eq!(stored.recurrence, None);

    wait(15 * 60).await;
    assert!(h.recorder.starts().is_empty());

    // A fresh process finds nothing to arm.
    let restarted = harness_with(h.store.clone());
    restarted.scheduler.init().unwrap();
    assert_eq!(restarted.scheduler.timer_counts(), (0, 0));
}

#[tokio::test(start_paused = true)]
async fn deschedule_while_starting_is_not_undone_by_recurrence() {
    let h = harness();
    h.recorder.start_delay_secs.store(10, Ordering::SeqCst);
    let start = whole_seconds(Utc::now() + Duration::seconds(3));
    let race = saved_race(&h.store, Some(start), Some(hourly_from(start)));
    let id = race.id;

    let event = ScheduledEvent::CustomRace(race);
    h.scheduler.schedule(event.clone(), start).unwrap();

    // The timer has fired and the manager is still busy starting the race.
    wait(8).await;
    assert!(!h.scheduler.has_start_timer(id));
    assert!(h.recorder.starts().is_empty());
    h.scheduler.deschedule(&event).unwrap();

    wait(10).await;
    assert_eq!(h.recorder.starts(), vec![id]);
    assert!(!h.scheduler.has_start_timer(id), "descheduled event was re-armed");

    let stored = h.store.load_custom_race(id).unwrap().unwrap();
    assert_eq!(stored.scheduled, None);
    assert_eq!(stored.recurrence, None);

    let restarted = harness_with(h.store.clone());
    restarted.scheduler.init().unwrap();
    assert_eq!(restarted.scheduler.timer_counts(), (0, 0));
}

#[tokio::test(start_paused = true)]
async fn deschedule_of_unknown_event_reports_not_found() {
    let h = harness();
    let ghost = CustomRace::new("Never Saved", RaceConfig::new("imola"), EntryList::new());

    let err = h
        .scheduler
        .deschedule(&ScheduledEvent::CustomRace(ghost))
        .unwrap_err();
    assert!(matches!(err, SchedulerError::EventNotFound { .. }));
}

#[tokio::test(start_paused = true)]
async fn shutdown_aborts_pending_timers() {
    let h = harness();
    let race = saved_race(&h.store, None, None);
    let id = race.id;

    h.scheduler
        .schedule(ScheduledEvent::CustomRace(race), Utc::now() + Duration::seconds(5))
        .unwrap();
    h.scheduler.shutdown();
    wait(10).await;

    assert!(h.recorder.starts().is_empty());
    assert!(!h.scheduler.has_start_timer(id));
}
