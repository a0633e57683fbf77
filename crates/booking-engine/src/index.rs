//! Time-slot occupancy index.
//!
//! Maps each date to the half-hour slots that have at least one table
//! occupied, and each slot to the set of occupied tables. Marking is a set
//! union, so applying the same record twice leaves the index unchanged.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::model::{OccupancyRecord, ResourceId};
use crate::slot::Slot;

static NO_OCCUPANTS: BTreeSet<ResourceId> = BTreeSet::new();

/// Date → slot → occupied tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSlotIndex {
    days: BTreeMap<NaiveDate, BTreeMap<Slot, BTreeSet<ResourceId>>>,
}

impl TimeSlotIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `resource` as occupying every slot in `[start, start + duration_slots)`
    /// on `date`.
    pub fn mark_occupied(
        &mut self,
        date: NaiveDate,
        start: Slot,
        duration_slots: u16,
        resource: &ResourceId,
    ) {
        if duration_slots == 0 {
            return;
        }
        let day = self.days.entry(date).or_default();
        for slot in start.span(duration_slots) {
            day.entry(slot).or_default().insert(resource.clone());
        }
    }

    /// Apply one occupancy record.
    pub fn apply(&mut self, record: &OccupancyRecord) {
        self.mark_occupied(
            record.date,
            record.start,
            record.duration_slots,
            &record.resource,
        );
    }

    /// Tables occupied at `slot` on `date`; empty when there are none.
    pub fn occupants_at(&self, date: NaiveDate, slot: Slot) -> &BTreeSet<ResourceId> {
        self.days
            .get(&date)
            .and_then(|day| day.get(&slot))
            .unwrap_or(&NO_OCCUPANTS)
    }

    pub fn is_occupied(&self, date: NaiveDate, slot: Slot, resource: &ResourceId) -> bool {
        self.occupants_at(date, slot).contains(resource)
    }

    /// Whether `resource` is free for the whole span `[start, start + duration_slots)`.
    pub fn is_free_for(
        &self,
        date: NaiveDate,
        start: Slot,
        duration_slots: u16,
        resource: &ResourceId,
    ) -> bool {
        start
            .span(duration_slots)
            .all(|slot| !self.is_occupied(date, slot, resource))
    }

    /// Dates with at least one occupied slot, in order.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.keys().copied()
    }

    /// Occupied slots on `date` with their tables, in slot order.
    pub fn slots_on(
        &self,
        date: NaiveDate,
    ) -> impl Iterator<Item = (Slot, &BTreeSet<ResourceId>)> + '_ {
        self.days
            .get(&date)
            .into_iter()
            .flat_map(|day| day.iter().map(|(slot, occupants)| (*slot, occupants)))
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
