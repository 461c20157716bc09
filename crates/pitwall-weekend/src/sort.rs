//! Result orderings a dependent session can apply to its prerequisite's
//! classification before the grid is built.

use std::cmp::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

use pitwall_core::{ResultEntry, SessionResults};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// A named reordering of result rows. Selected by key with
/// [`SortStrategy::from_key`]; unknown keys fall back to [`SortStrategy::NoSort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortStrategy {
    /// Keep finishing order.
    #[default]
    NoSort,
    FastestLap,
    TotalRaceTime,
    FewestCollisions,
    FewestCuts,
    /// Fewest collisions, then fewest cuts.
    Safety,
    /// Uniform shuffle from a time-seeded generator. Not reproducible.
    Random,
}

impl SortStrategy {
    pub const ALL: [SortStrategy; 7] = [
        SortStrategy::NoSort,
        SortStrategy::FastestLap,
        SortStrategy::TotalRaceTime,
        SortStrategy::FewestCollisions,
        SortStrategy::FewestCuts,
        SortStrategy::Safety,
        SortStrategy::Random,
    ];

    pub fn from_key(key: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|s| s.key() == key)
            .unwrap_or_default()
    }

    pub fn key(self) -> &'static str {
        match self {
            SortStrategy::NoSort => "no_sort",
            SortStrategy::FastestLap => "fastest_lap",
            SortStrategy::TotalRaceTime => "total_race_time",
            SortStrategy::FewestCollisions => "fewest_collisions",
            SortStrategy::FewestCuts => "fewest_cuts",
            SortStrategy::Safety => "safety",
            SortStrategy::Random => "random",
        }
    }

    /// Reorder `rows` in place. `results` is the session the rows came from;
    /// it decides which tie-break the incident-based orderings use.
    pub fn sort(self, results: &SessionResults, rows: &mut [ResultEntry]) {
        let tie_break: fn(&ResultEntry, &ResultEntry) -> Ordering = if results.is_race() {
            by_total_race_time
        } else {
            by_fastest_lap
        };

        match self {
            SortStrategy::NoSort => {}
            SortStrategy::FastestLap => rows.sort_by(by_fastest_lap),
            SortStrategy::TotalRaceTime => rows.sort_by(by_total_race_time),
            SortStrategy::FewestCollisions => {
                rows.sort_by(|a, b| a.collisions.cmp(&b.collisions).then_with(|| tie_break(a, b)))
            }
            SortStrategy::FewestCuts => rows.sort_by(|a, b| a.cuts.cmp(&b.cuts).then_with(|| tie_break(a, b))),
            SortStrategy::Safety => rows.sort_by(|a, b| {
                a.collisions
                    .cmp(&b.collisions)
                    .then(a.cuts.cmp(&b.cuts))
                    .then_with(|| tie_break(a, b))
            }),
            SortStrategy::Random => rows.shuffle(&mut StdRng::seed_from_u64(time_seed())),
        }
    }
}

/// Best lap ascending, no lap last; then fewer collisions, then fewer cuts.
fn by_fastest_lap(a: &ResultEntry, b: &ResultEntry) -> Ordering {
    let laps = match (a.best_lap_ms, b.best_lap_ms) {
        (0, 0) => Ordering::Equal,
        (0, _) => Ordering::Greater,
        (_, 0) => Ordering::Less,
        (x, y) => x.cmp(&y),
    };
    laps.then(a.collisions.cmp(&b.collisions)).then(a.cuts.cmp(&b.cuts))
}

/// More laps first; equal laps by total time ascending.
fn by_total_race_time(a: &ResultEntry, b: &ResultEntry) -> Ordering {
    b.num_laps
        .cmp(&a.num_laps)
        .then(a.total_time_ms.cmp(&b.total_time_ms))
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
