//! Remote seam for the availability feeds and the reservation write.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;

use crate::error::Result;
use crate::model::ReservationPayload;

/// Source of the three availability feeds and sink for reservations.
///
/// Feed methods return raw JSON records; normalisation happens in the loader
/// so that one malformed record never fails a whole feed.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    /// Confirmed reservations dated within `[start, end]`.
    async fn fetch_reservations(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>>;

    /// Non-repeating blocking events dated within `[start, end]`.
    async fn fetch_one_off_events(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>>;

    /// Repeating blocking events that started on or before `end`.
    async fn fetch_recurring_events(&self, end: NaiveDate) -> Result<Vec<Value>>;

    /// Write one reservation. `Ok` means the server acknowledged it.
    async fn submit_reservation(&self, payload: &ReservationPayload) -> Result<()>;
}
