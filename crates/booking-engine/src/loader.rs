//! Three-feed availability load with daily recurrence expansion.
//!
//! A load reads confirmed reservations, one-off blocking events and
//! recurring blocking events concurrently, and only once all three have
//! arrived builds a brand-new [`TimeSlotIndex`] from them. The new index is
//! published in one step, and only if no newer load was issued meanwhile.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::backend::BookingBackend;
use crate::config::BookingConfig;
use crate::error::{BookingError, Result};
use crate::index::TimeSlotIndex;
use crate::model::{FeedRecord, RecordIssue, RepeatMode};
use crate::store::AvailabilityStore;

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// # Errors
    /// Returns `BookingError::InvalidWindow` if `end` is before `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(BookingError::InvalidWindow { start, end });
        }
        Ok(DateWindow { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Every date from `start` to `end` inclusive, stepped by whole days.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        let span = u64::try_from((self.end - self.start).num_days()).unwrap_or(0);
        (0..=span).filter_map(move |offset| start.checked_add_days(Days::new(offset)))
    }
}

/// What one build of the index did with the feed records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub generation: u64,
    pub window: DateWindow,
    /// Records that contributed occupancy (a daily record counts once).
    pub applied: usize,
    pub skipped_malformed: usize,
    pub skipped_unrecognized: usize,
}

/// Result of a load that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Published(LoadReport),
    /// A newer load was issued before this one finished; nothing was published.
    Superseded { generation: u64 },
}

impl LoadOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, LoadOutcome::Published(_))
    }
}

pub struct AvailabilityLoader {
    backend: Arc<dyn BookingBackend>,
    store: Arc<AvailabilityStore>,
    config: BookingConfig,
}

impl AvailabilityLoader {
    pub fn new(
        backend: Arc<dyn BookingBackend>,
        store: Arc<AvailabilityStore>,
        config: BookingConfig,
    ) -> Self {
        AvailabilityLoader {
            backend,
            store,
            config,
        }
    }

    /// Load the bookable window starting at `today`.
    pub async fn load_upcoming(&self, today: NaiveDate) -> Result<LoadOutcome> {
        let window = self.config.window_from(today)?;
        self.load(window).await
    }

    /// Fetch all three feeds for `window` and publish the merged index.
    ///
    /// # Errors
    /// Returns the first transport failure among the three feeds. The
    /// previously published index is left untouched in that case.
    pub async fn load(&self, window: DateWindow) -> Result<LoadOutcome> {
        let generation = self.store.begin_load();
        debug!(generation, start = %window.start, end = %window.end, "loading availability");

        let fetched = tokio::try_join!(
            self.backend.fetch_reservations(window.start, window.end),
            self.backend.fetch_one_off_events(window.start, window.end),
            self.backend.fetch_recurring_events(window.end),
        );
        let (reservations, one_off, recurring) = match fetched {
            Ok(feeds) => feeds,
            Err(e) => {
                warn!(generation, error = %e, "availability load failed, keeping previous index");
                return Err(e);
            }
        };

        let (index, report) = build_index(
            generation,
            window,
            [
                reservations.as_slice(),
                one_off.as_slice(),
                recurring.as_slice(),
            ],
        );

        if self.store.publish(generation, index) {
            info!(
                generation,
                applied = report.applied,
                skipped_malformed = report.skipped_malformed,
                skipped_unrecognized = report.skipped_unrecognized,
                "availability load complete"
            );
            Ok(LoadOutcome::Published(report))
        } else {
            Ok(LoadOutcome::Superseded { generation })
        }
    }
}

/// Build a fresh index from raw feed batches.
///
/// One-off records land on their own date; `daily` records land on every date
/// of `window`. Malformed records and records with an unknown repeat mode are
/// skipped one by one and counted in the report.
pub fn build_index(
    generation: u64,
    window: DateWindow,
    batches: [&[Value]; 3],
) -> (TimeSlotIndex, LoadReport) {
    let mut index = TimeSlotIndex::new();
    let mut report = LoadReport {
        generation,
        window,
        applied: 0,
        skipped_malformed: 0,
        skipped_unrecognized: 0,
    };

    for raw in batches.into_iter().flatten() {
        let record = match FeedRecord::from_json(raw) {
            Ok(record) => record,
            Err(RecordIssue::UnrecognizedRepeat(mode)) => {
                debug!(%mode, "skipping record with unrecognized repeat mode");
                report.skipped_unrecognized += 1;
                continue;
            }
            Err(issue) => {
                warn!(%issue, record = %raw, "skipping malformed feed record");
                report.skipped_malformed += 1;
                continue;
            }
        };

        match record.repeat {
            RepeatMode::Daily => {
                for date in window.dates() {
                    index.apply(&record.occupancy.on(date));
                }
            }
            RepeatMode::None => index.apply(&record.occupancy),
        }
        report.applied += 1;
    }

    (index, report)
}
