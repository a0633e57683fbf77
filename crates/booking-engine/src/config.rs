//! Booking configuration.
//!
//! Everything the loader, controller and submitter need to know about the
//! venue (where the feeds live, opening hours, how far ahead guests may book,
//! the allowed party sizes and durations) is carried in one [`BookingConfig`]
//! value and handed to each component at construction.

use std::path::Path;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};
use crate::loader::DateWindow;
use crate::slot::{duration_slots_from_hours, Slot, SLOTS_PER_DAY, SLOTS_PER_HOUR};

/// Which slots of a candidate reservation are checked for conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSpan {
    /// Only the selected start slot.
    #[default]
    StartSlot,
    /// Every slot from the start up to the selected duration.
    FullDuration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Base URL of the booking API, without a trailing slash.
    pub base_url: String,
    pub bookings_path: String,
    pub events_path: String,
    /// Per-request timeout for feed reads and the reservation write.
    pub request_timeout_secs: u64,
    /// First whole hour a reservation may start at.
    pub opening_hour: u16,
    /// Hour by which every reservation must have ended (24 is midnight).
    pub closing_hour: u16,
    /// Days after today that are still bookable; the loaded window is
    /// `[today, today + max_days_ahead]`.
    pub max_days_ahead: u32,
    pub min_people: u8,
    pub max_people: u8,
    /// Shortest reservation in hours.
    pub min_duration_hours: f64,
    /// Longest reservation in hours.
    pub max_duration_hours: f64,
    pub conflict_span: ConflictSpan,
    /// Buffered change signals per subscriber before the slowest one lags.
    pub event_capacity: usize,
}

impl Default for BookingConfig {
    fn default() -> Self {
        BookingConfig {
            base_url: "http://localhost:3131".to_string(),
            bookings_path: "booking".to_string(),
            events_path: "event".to_string(),
            request_timeout_secs: 10,
            opening_hour: 12,
            closing_hour: 24,
            max_days_ahead: 14,
            min_people: 1,
            max_people: 9,
            min_duration_hours: 0.5,
            max_duration_hours: 9.0,
            conflict_span: ConflictSpan::StartSlot,
            event_capacity: 64,
        }
    }
}

impl BookingConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: BookingConfig =
            toml::from_str(raw).map_err(|e| BookingError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| BookingError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&raw)
    }

    /// Reject configurations no booking could ever satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(BookingError::Config("base_url is empty".to_string()));
        }
        if self.opening_hour >= self.closing_hour || self.closing_hour > 24 {
            return Err(BookingError::Config(format!(
                "opening hours {}-{} are not a valid range",
                self.opening_hour, self.closing_hour
            )));
        }
        if self.min_people == 0 || self.min_people > self.max_people {
            return Err(BookingError::Config(format!(
                "people range {}-{} is not a valid range",
                self.min_people, self.max_people
            )));
        }
        match (
            duration_slots_from_hours(self.min_duration_hours),
            duration_slots_from_hours(self.max_duration_hours),
        ) {
            (Some(min), Some(max)) if min <= max => {}
            _ => {
                return Err(BookingError::Config(format!(
                    "duration range {}-{} hours is not a valid half-hour range",
                    self.min_duration_hours, self.max_duration_hours
                )))
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(BookingError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(BookingError::Config("event_capacity must be positive".to_string()));
        }
        Ok(())
    }

    /// The window of dates a guest may book starting from `today`.
    pub fn window_from(&self, today: NaiveDate) -> Result<DateWindow> {
        let end = today
            .checked_add_days(Days::new(u64::from(self.max_days_ahead)))
            .ok_or_else(|| {
                BookingError::Config("max_days_ahead overflows the calendar".to_string())
            })?;
        DateWindow::new(today, end)
    }

    pub fn opening_slot(&self) -> Slot {
        Slot::at_hour(self.opening_hour)
    }

    pub fn closing_slot(&self) -> Slot {
        Slot::from_half_hours((self.closing_hour * SLOTS_PER_HOUR).min(SLOTS_PER_DAY))
    }

    /// Check a reservation's party size, duration and opening-hours fit.
    pub fn check_reservation(&self, start: Slot, duration_slots: u16, people: u8) -> Result<()> {
        if people < self.min_people || people > self.max_people {
            return Err(BookingError::InvalidRequest(format!(
                "party of {} is outside {}-{}",
                people, self.min_people, self.max_people
            )));
        }
        let min = duration_slots_from_hours(self.min_duration_hours).unwrap_or(1);
        let max = duration_slots_from_hours(self.max_duration_hours).unwrap_or(u16::MAX);
        if duration_slots < min || duration_slots > max {
            return Err(BookingError::InvalidRequest(format!(
                "duration of {} slots is outside {}-{} hours",
                duration_slots, self.min_duration_hours, self.max_duration_hours
            )));
        }
        let end = start.offset(duration_slots);
        if start < self.opening_slot() || end > self.closing_slot() {
            return Err(BookingError::InvalidRequest(format!(
                "{}-{} is outside opening hours {:02}:00-{:02}:00",
                start, end, self.opening_hour, self.closing_hour
            )));
        }
        Ok(())
    }

    pub(crate) fn bookings_url(&self) -> String {
        join_url(&self.base_url, &self.bookings_path)
    }

    pub(crate) fn events_url(&self) -> String {
        join_url(&self.base_url, &self.events_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
