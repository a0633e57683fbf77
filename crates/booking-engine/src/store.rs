//! The published occupancy index and its change signals.
//!
//! Readers take an `Arc` snapshot of the current [`TimeSlotIndex`]; writers
//! either swap in a whole new index (a load) or patch a copy of the current
//! one (a submission). Both happen under one write lock, so no reader ever
//! sees a half-built index.
//!
//! A load's response may have been produced before a reservation that was
//! patched in while the load was in flight. Patches are therefore kept until
//! every load issued before them has either published or been superseded, and
//! are replayed onto such a load's index when it publishes.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::index::TimeSlotIndex;
use crate::model::{OccupancyRecord, ResourceId};

/// Typed signals the UI layer subscribes to.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingEvent {
    /// A load published a fresh index.
    IndexUpdated { generation: u64 },
    /// A successful submission patched the current index.
    IndexPatched { record: OccupancyRecord },
    SelectionChanged { selection: Option<ResourceId> },
    /// A pick was refused because the table is occupied.
    SelectionRejected { resource: ResourceId },
    SubmissionSucceeded { record: OccupancyRecord },
    SubmissionFailed { message: String },
}

#[derive(Debug)]
struct Published {
    /// Generation of the most recently issued load, published or not.
    latest_issued: u64,
    /// Generation whose result is currently published; 0 before any load.
    published: u64,
    index: Arc<TimeSlotIndex>,
    /// Records patched while a load was in flight, tagged with the newest
    /// generation issued at the time of the patch.
    patches: Vec<(u64, OccupancyRecord)>,
}

/// Shared, generation-tagged holder of the current index.
#[derive(Debug)]
pub struct AvailabilityStore {
    state: RwLock<Published>,
    events: broadcast::Sender<BookingEvent>,
}

impl AvailabilityStore {
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        AvailabilityStore {
            state: RwLock::new(Published {
                latest_issued: 0,
                published: 0,
                index: Arc::new(TimeSlotIndex::new()),
                patches: Vec::new(),
            }),
            events,
        }
    }

    /// Snapshot of the current index.
    pub fn current(&self) -> Arc<TimeSlotIndex> {
        Arc::clone(&self.state.read().index)
    }

    /// Generation of the currently published load (0 if nothing was loaded).
    pub fn published_generation(&self) -> u64 {
        self.state.read().published
    }

    /// Generation of the most recently issued load.
    pub fn latest_generation(&self) -> u64 {
        self.state.read().latest_issued
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.events.subscribe()
    }

    /// Reserve the generation number for a new load, superseding older ones.
    pub(crate) fn begin_load(&self) -> u64 {
        let mut state = self.state.write();
        state.latest_issued += 1;
        state.latest_issued
    }

    /// Publish `index` if `generation` is still the latest issued load.
    ///
    /// Patches made since `generation` was issued are reapplied first. Returns
    /// `false`, leaving the current index untouched, when a newer load has
    /// been issued since.
    pub(crate) fn publish(&self, generation: u64, mut index: TimeSlotIndex) -> bool {
        let replayed = {
            let mut state = self.state.write();
            if generation != state.latest_issued {
                debug!(
                    generation,
                    latest = state.latest_issued,
                    "discarding superseded availability load"
                );
                return false;
            }
            // Only a load issued before a patch can be missing its write.
            let mut replayed = 0;
            for (issued, record) in state.patches.drain(..) {
                if issued >= generation {
                    index.apply(&record);
                    replayed += 1;
                }
            }
            state.index = Arc::new(index);
            state.published = generation;
            replayed
        };
        info!(generation, replayed, "published availability index");
        self.emit(BookingEvent::IndexUpdated { generation });
        true
    }

    /// Add one record's occupancy to the current index in place.
    pub(crate) fn patch(&self, record: &OccupancyRecord) {
        {
            let mut state = self.state.write();
            Arc::make_mut(&mut state.index).apply(record);
            if state.latest_issued > state.published {
                let issued = state.latest_issued;
                state.patches.push((issued, record.clone()));
            }
        }
        debug!(
            date = %record.date,
            start = %record.start,
            table = %record.resource,
            "patched availability index"
        );
        self.emit(BookingEvent::IndexPatched {
            record: record.clone(),
        });
    }

    pub(crate) fn emit(&self, event: BookingEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

impl Default for AvailabilityStore {
    fn default() -> Self {
        AvailabilityStore::new(64)
    }
}
