//! Reservation write with optimistic index patch.
//!
//! After the server acknowledges a reservation, the same occupancy is added to
//! the live index straight away instead of reloading all three feeds. A failed
//! write changes nothing locally.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::backend::BookingBackend;
use crate::config::BookingConfig;
use crate::error::{BookingError, Result};
use crate::model::{OccupancyRecord, ReservationPayload};
use crate::selection::SelectionController;
use crate::store::{AvailabilityStore, BookingEvent};

/// Fields of the surrounding order form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDetails {
    pub address: String,
    pub phone: String,
    /// Extras picked in the form (e.g. water, bread).
    pub selected_options: Vec<String>,
}

pub struct ReservationSubmitter {
    backend: Arc<dyn BookingBackend>,
    store: Arc<AvailabilityStore>,
    config: BookingConfig,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when the attempt ends, including on cancellation.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ReservationSubmitter {
    pub fn new(
        backend: Arc<dyn BookingBackend>,
        store: Arc<AvailabilityStore>,
        config: BookingConfig,
    ) -> Self {
        ReservationSubmitter {
            backend,
            store,
            config,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Write the controller's current selection as a reservation.
    ///
    /// On success the returned record has already been added to the live
    /// index and the controller is back to idle.
    ///
    /// # Errors
    /// - `BookingError::SubmissionInFlight` if another submission has not finished.
    /// - `BookingError::NoSelection` if no table is selected.
    /// - `BookingError::ResourceUnavailable` if the selected table became
    ///   occupied after it was picked (e.g. by a reload).
    /// - `BookingError::InvalidRequest` if party size, duration or opening
    ///   hours are out of range.
    /// - `BookingError::Transport` if the write fails; index and selection are
    ///   unchanged.
    pub async fn submit(
        &self,
        controller: &mut SelectionController,
        contact: &ContactDetails,
    ) -> Result<OccupancyRecord> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BookingError::SubmissionInFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        let record = controller.pending_record().ok_or(BookingError::NoSelection)?;
        if !controller.is_available(&record.resource) {
            return Err(BookingError::ResourceUnavailable(record.resource));
        }
        let params = controller.params();
        self.config
            .check_reservation(record.start, record.duration_slots, params.people)?;

        let payload = ReservationPayload::new(
            &record,
            params.people,
            contact.selected_options.clone(),
            contact.address.clone(),
            contact.phone.clone(),
        );

        if let Err(e) = self.backend.submit_reservation(&payload).await {
            warn!(
                table = %record.resource,
                date = %record.date,
                error = %e,
                "reservation write failed"
            );
            self.store.emit(BookingEvent::SubmissionFailed {
                message: e.to_string(),
            });
            return Err(e);
        }

        info!(
            table = %record.resource,
            date = %record.date,
            start = %record.start,
            "reservation accepted"
        );
        self.store.patch(&record);
        controller.reset();
        self.store.emit(BookingEvent::SubmissionSucceeded {
            record: record.clone(),
        });
        Ok(record)
    }
}
