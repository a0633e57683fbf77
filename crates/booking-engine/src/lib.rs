//! # booking-engine
//!
//! Table availability and selection engine for a restaurant booking widget.
//!
//! The engine merges three independent feeds (confirmed reservations, one-off
//! blocking events and daily recurring blocking events) into a single
//! half-hour occupancy index, tracks the table a guest is choosing against
//! that index, and patches the index locally after a reservation is written.
//!
//! ## Modules
//!
//! - [`slot`]: half-hour time-of-day values and duration conversion
//! - [`model`]: resource keys, feed records and the reservation payload
//! - [`index`]: date → slot → occupied tables
//! - [`store`]: the published index snapshot and change signals
//! - [`backend`]: async seam for the feeds and the reservation write
//! - [`http`]: the JSON-over-HTTP backend
//! - [`loader`]: concurrent three-feed load with recurrence expansion
//! - [`selection`]: the guest's in-progress table choice
//! - [`submitter`]: reservation write with optimistic index patch
//! - [`config`]: explicit configuration passed at construction
//! - [`error`]: Error types

pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod index;
pub mod loader;
pub mod model;
pub mod selection;
pub mod slot;
pub mod store;
pub mod submitter;

pub use backend::BookingBackend;
pub use config::{BookingConfig, ConflictSpan};
pub use error::BookingError;
pub use http::HttpBackend;
pub use index::TimeSlotIndex;
pub use loader::{AvailabilityLoader, DateWindow, LoadOutcome, LoadReport};
pub use model::{OccupancyRecord, RepeatMode, ReservationPayload, ResourceId};
pub use selection::{BookingParams, SelectionController, SelectionState};
pub use slot::Slot;
pub use store::{AvailabilityStore, BookingEvent};
pub use submitter::{ContactDetails, ReservationSubmitter};
