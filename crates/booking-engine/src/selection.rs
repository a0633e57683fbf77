//! The guest's in-progress table choice.
//!
//! A selection is only meaningful for the exact date, start slot and
//! duration it was made under, so changing any of them drops it. Availability
//! is read from the store's current snapshot on every call, which keeps it in
//! step with reloads and optimistic patches without any caching here.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::config::{BookingConfig, ConflictSpan};
use crate::error::{BookingError, Result};
use crate::model::{OccupancyRecord, ResourceId};
use crate::slot::Slot;
use crate::store::{AvailabilityStore, BookingEvent};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Selected(ResourceId),
}

/// Values supplied by the date picker, hour picker and the two amount widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingParams {
    pub date: NaiveDate,
    pub slot: Slot,
    pub duration_slots: u16,
    pub people: u8,
}

pub struct SelectionController {
    store: Arc<AvailabilityStore>,
    conflict_span: ConflictSpan,
    params: BookingParams,
    state: SelectionState,
}

impl SelectionController {
    pub fn new(
        store: Arc<AvailabilityStore>,
        config: &BookingConfig,
        params: BookingParams,
    ) -> Self {
        SelectionController {
            store,
            conflict_span: config.conflict_span,
            params,
            state: SelectionState::Idle,
        }
    }

    pub fn params(&self) -> BookingParams {
        self.params
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn current_selection(&self) -> Option<&ResourceId> {
        match &self.state {
            SelectionState::Idle => None,
            SelectionState::Selected(resource) => Some(resource),
        }
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        if self.params.date != date {
            self.params.date = date;
            self.invalidate();
        }
    }

    pub fn set_slot(&mut self, slot: Slot) {
        if self.params.slot != slot {
            self.params.slot = slot;
            self.invalidate();
        }
    }

    /// Set the start time from the hour picker's display value (e.g. `19.5`).
    ///
    /// # Errors
    /// Returns `BookingError::InvalidRequest` if `hour` is not on a half-hour.
    pub fn set_hour(&mut self, hour: f64) -> Result<()> {
        let slot = Slot::from_display_hour(hour)
            .ok_or_else(|| BookingError::InvalidRequest(format!("{hour} is not a half-hour")))?;
        self.set_slot(slot);
        Ok(())
    }

    pub fn set_duration(&mut self, duration_slots: u16) {
        if self.params.duration_slots != duration_slots {
            self.params.duration_slots = duration_slots;
            self.invalidate();
        }
    }

    /// The party size does not affect which table is free, so the selection stays.
    pub fn set_people(&mut self, people: u8) {
        self.params.people = people;
    }

    /// Whether `resource` can be chosen for the current date and slot.
    pub fn is_available(&self, resource: &ResourceId) -> bool {
        let index = self.store.current();
        match self.conflict_span {
            ConflictSpan::StartSlot => {
                !index.is_occupied(self.params.date, self.params.slot, resource)
            }
            ConflictSpan::FullDuration => index.is_free_for(
                self.params.date,
                self.params.slot,
                self.params.duration_slots.max(1),
                resource,
            ),
        }
    }

    /// Availability flag for each table element the UI renders.
    pub fn availability<'a, I>(&self, resources: I) -> Vec<(ResourceId, bool)>
    where
        I: IntoIterator<Item = &'a ResourceId>,
    {
        resources
            .into_iter()
            .map(|resource| (resource.clone(), self.is_available(resource)))
            .collect()
    }

    /// Toggle `resource` as the chosen table.
    ///
    /// Choosing the selected table again deselects it; choosing another
    /// available table replaces the selection.
    ///
    /// # Errors
    /// Returns `BookingError::ResourceUnavailable` and leaves the state as it
    /// was if the table is occupied.
    pub fn pick(&mut self, resource: ResourceId) -> Result<&SelectionState> {
        if !self.is_available(&resource) {
            debug!(
                table = %resource,
                date = %self.params.date,
                slot = %self.params.slot,
                "table unavailable"
            );
            self.store.emit(BookingEvent::SelectionRejected {
                resource: resource.clone(),
            });
            return Err(BookingError::ResourceUnavailable(resource));
        }

        self.state = match &self.state {
            SelectionState::Selected(current) if *current == resource => SelectionState::Idle,
            _ => SelectionState::Selected(resource),
        };
        self.store.emit(BookingEvent::SelectionChanged {
            selection: self.current_selection().cloned(),
        });
        Ok(&self.state)
    }

    /// Drop the selection, if any.
    pub fn reset(&mut self) {
        self.invalidate();
    }

    /// The occupancy the current selection would create, if there is one.
    pub fn pending_record(&self) -> Option<OccupancyRecord> {
        self.current_selection().map(|resource| OccupancyRecord {
            date: self.params.date,
            start: self.params.slot,
            duration_slots: self.params.duration_slots,
            resource: resource.clone(),
        })
    }

    fn invalidate(&mut self) {
        if self.state != SelectionState::Idle {
            self.state = SelectionState::Idle;
            self.store
                .emit(BookingEvent::SelectionChanged { selection: None });
        }
    }
}
