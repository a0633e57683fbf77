//! Half-hour time-of-day slots.
//!
//! A [`Slot`] is an integer count of half-hours since midnight, so `18:00` is
//! slot 36 and `18:30` is slot 37. Stepping through a reservation is integer
//! arithmetic; the display hour (`18.5`) and the wire string (`"18:30"`) are
//! only produced at the edges.

use std::fmt;
use std::str::FromStr;

use crate::error::BookingError;

/// Number of slots in one hour.
pub const SLOTS_PER_HOUR: u16 = 2;

/// Number of slots in one calendar day.
pub const SLOTS_PER_DAY: u16 = 24 * SLOTS_PER_HOUR;

/// A half-hour time-of-day value.
///
/// Values of [`SLOTS_PER_DAY`] and above are legal: they describe the part of
/// a reservation that runs past midnight and stay on the reservation's date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slot(u16);

impl Slot {
    pub const fn from_half_hours(half_hours: u16) -> Self {
        Slot(half_hours)
    }

    pub const fn half_hours(self) -> u16 {
        self.0
    }

    /// Slot at the start of a whole hour.
    pub const fn at_hour(hour: u16) -> Self {
        Slot(hour * SLOTS_PER_HOUR)
    }

    /// Parse a wire hour of the form `H:MM` or `HH:MM`.
    ///
    /// Minutes must be `00` or `30`; any other value does not fall on a slot
    /// boundary and yields `None`.
    pub fn parse_hour(raw: &str) -> Option<Self> {
        let (hours, minutes) = raw.trim().split_once(':')?;
        if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
            return None;
        }
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !digits(hours) || !digits(minutes) {
            return None;
        }
        let hours: u16 = hours.parse().ok()?;
        if hours >= 24 {
            return None;
        }
        let half = match minutes {
            "00" => 0,
            "30" => 1,
            _ => return None,
        };
        Some(Slot(hours * SLOTS_PER_HOUR + half))
    }

    /// Convert a display hour such as `19.5` into a slot.
    ///
    /// Returns `None` for negative, non-finite or non-half-hour values.
    pub fn from_display_hour(hour: f64) -> Option<Self> {
        let half_hours = half_hours_from_hours(hour)?;
        Some(Slot(half_hours))
    }

    /// The display hour value, e.g. `18.5` for `18:30`.
    pub fn display_hour(self) -> f64 {
        f64::from(self.0) / f64::from(SLOTS_PER_HOUR)
    }

    /// The slot `count` half-hours later.
    pub fn offset(self, count: u16) -> Self {
        Slot(self.0.saturating_add(count))
    }

    /// Every slot in `[self, self + duration_slots)`.
    pub fn span(self, duration_slots: u16) -> impl Iterator<Item = Slot> {
        let end = self.0.saturating_add(duration_slots);
        (self.0..end).map(Slot)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hours = self.0 / SLOTS_PER_HOUR;
        let minutes = (self.0 % SLOTS_PER_HOUR) * 30;
        write!(f, "{:02}:{:02}", hours, minutes)
    }
}

impl FromStr for Slot {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Slot::parse_hour(s)
            .ok_or_else(|| BookingError::InvalidRequest(format!("not a half-hour time: {s:?}")))
    }
}

/// Convert a duration in hours (0.5 increments) into a number of slots.
///
/// Zero, negative, non-finite and non-half-hour durations yield `None`.
pub fn duration_slots_from_hours(hours: f64) -> Option<u16> {
    match half_hours_from_hours(hours)? {
        0 => None,
        slots => Some(slots),
    }
}

/// Convert a number of slots back into hours for the wire.
pub fn hours_from_duration_slots(slots: u16) -> f64 {
    f64::from(slots) / f64::from(SLOTS_PER_HOUR)
}

fn half_hours_from_hours(hours: f64) -> Option<u16> {
    if !hours.is_finite() || hours < 0.0 {
        return None;
    }
    let scaled = hours * f64::from(SLOTS_PER_HOUR);
    let rounded = scaled.round();
    if (scaled - rounded).abs() > 1e-9 || rounded > f64::from(u16::MAX) {
        return None;
    }
    // Range-checked above.
    Some(rounded as u16)
}

