//! Error types for booking-engine operations.

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::ResourceId;

/// Which remote call a transport failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    Reservations,
    OneOffEvents,
    RecurringEvents,
    Submission,
}

impl std::fmt::Display for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Feed::Reservations => "reservations",
            Feed::OneOffEvents => "one-off events",
            Feed::RecurringEvents => "recurring events",
            Feed::Submission => "reservation write",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum BookingError {
    /// A feed read or the reservation write failed, or returned a failure status.
    #[error("{feed} request failed: {message}")]
    Transport { feed: Feed, message: String },

    #[error("table {0} is not available at the selected time")]
    ResourceUnavailable(ResourceId),

    #[error("no table selected")]
    NoSelection,

    #[error("a reservation is already being submitted")]
    SubmissionInFlight,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid date window: {start} is after {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl BookingError {
    pub(crate) fn transport(feed: Feed, message: impl Into<String>) -> Self {
        BookingError::Transport {
            feed,
            message: message.into(),
        }
    }

    /// Whether retrying the same user action may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BookingError::Transport { .. } | BookingError::SubmissionInFlight
        )
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;
