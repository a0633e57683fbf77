//! Canonical booking values and feed record ingestion.
//!
//! Feed records arrive as loosely typed JSON (`table` may be a number or a
//! string, `hour` is a string, `duration` a number of hours). They are
//! normalised exactly once, here, into [`OccupancyRecord`] values; nothing
//! downstream ever compares raw feed values.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::error::BookingError;
use crate::slot::{duration_slots_from_hours, hours_from_duration_slots, Slot};

/// Wire format of every date in the feeds and the reservation payload.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Canonical key of a reservable table.
///
/// Textual identifiers made only of ASCII digits normalise to `Numeric`, so
/// `3` and `"3"` from different feeds name the same table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum ResourceId {
    Numeric(u32),
    Text(String),
}

impl ResourceId {
    /// Normalise a textual identifier. Returns `None` for blank input.
    pub fn from_text(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = trimmed.parse::<u32>() {
                return Some(ResourceId::Numeric(n));
            }
        }
        Some(ResourceId::Text(trimmed.to_string()))
    }

    /// Normalise a JSON identifier (number or string).
    ///
    /// Numbers must be non-negative integers that fit in `u32`; `3.0` is
    /// accepted as `3`.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(int) = n.as_u64() {
                    return u32::try_from(int).ok().map(ResourceId::Numeric);
                }
                let float = n.as_f64()?;
                let integral = float.is_finite() && float >= 0.0 && float.fract() == 0.0;
                if integral && float <= f64::from(u32::MAX) {
                    // Integral and in range, checked above.
                    Some(ResourceId::Numeric(float as u32))
                } else {
                    None
                }
            }
            Value::String(s) => ResourceId::from_text(s),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Numeric(n) => write!(f, "{n}"),
            ResourceId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u32> for ResourceId {
    fn from(n: u32) -> Self {
        ResourceId::Numeric(n)
    }
}

impl FromStr for ResourceId {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceId::from_text(s)
            .ok_or_else(|| BookingError::InvalidRequest("empty table identifier".to_string()))
    }
}

impl<'de> Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        ResourceId::from_json(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid table identifier: {value}")))
    }
}

/// How a blocking event repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatMode {
    /// One-off: applies on the record's own date.
    None,
    /// Applies on every date of the loaded window, whatever the weekday.
    Daily,
}

impl RepeatMode {
    /// Read the `repeat` field. Absent, `null` and `false` all mean one-off.
    ///
    /// # Errors
    /// Any other value is a mode this engine does not know and yields
    /// [`RecordIssue::UnrecognizedRepeat`] carrying the raw JSON.
    pub fn from_json(value: Option<&Value>) -> Result<Self, RecordIssue> {
        match value {
            None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(RepeatMode::None),
            Some(Value::String(s)) if s == "daily" => Ok(RepeatMode::Daily),
            Some(other) => Err(RecordIssue::UnrecognizedRepeat(other.to_string())),
        }
    }
}

/// One table blocked for a contiguous run of slots on one date.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OccupancyRecord {
    pub date: NaiveDate,
    pub start: Slot,
    pub duration_slots: u16,
    pub resource: ResourceId,
}

impl OccupancyRecord {
    /// First slot after the record.
    pub fn end(&self) -> Slot {
        self.start.offset(self.duration_slots)
    }

    /// The same occupancy moved to another date.
    pub fn on(&self, date: NaiveDate) -> Self {
        OccupancyRecord {
            date,
            ..self.clone()
        }
    }
}

/// Why a feed record could not be ingested.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordIssue {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("missing or non-string field `{0}`")]
    MissingField(&'static str),

    #[error("unparseable date {0:?}")]
    InvalidDate(String),

    #[error("unparseable hour {0:?}")]
    InvalidHour(String),

    #[error("unusable duration {0}")]
    InvalidDuration(String),

    #[error("unusable table identifier {0}")]
    InvalidTable(String),

    #[error("unrecognized repeat mode {0}")]
    UnrecognizedRepeat(String),
}

/// A normalised feed entry: an occupancy plus its repeat mode.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRecord {
    pub occupancy: OccupancyRecord,
    pub repeat: RepeatMode,
}

impl FeedRecord {
    /// Normalise one raw feed entry.
    ///
    /// The repeat mode is checked first so that records from a newer feed
    /// format are reported as [`RecordIssue::UnrecognizedRepeat`] rather than
    /// as malformed.
    pub fn from_json(value: &Value) -> Result<Self, RecordIssue> {
        let object = value.as_object().ok_or(RecordIssue::NotAnObject)?;

        let repeat = RepeatMode::from_json(object.get("repeat"))?;

        let raw_date = string_field(object, "date")?;
        let date = NaiveDate::parse_from_str(raw_date.trim(), DATE_FORMAT)
            .map_err(|_| RecordIssue::InvalidDate(raw_date.to_string()))?;

        let raw_hour = string_field(object, "hour")?;
        let start = Slot::parse_hour(raw_hour)
            .ok_or_else(|| RecordIssue::InvalidHour(raw_hour.to_string()))?;

        let raw_duration = object.get("duration").cloned().unwrap_or(Value::Null);
        let duration_slots = duration_from_json(&raw_duration)
            .ok_or_else(|| RecordIssue::InvalidDuration(raw_duration.to_string()))?;

        let raw_table = object.get("table").cloned().unwrap_or(Value::Null);
        let resource = ResourceId::from_json(&raw_table)
            .ok_or_else(|| RecordIssue::InvalidTable(raw_table.to_string()))?;

        Ok(FeedRecord {
            occupancy: OccupancyRecord {
                date,
                start,
                duration_slots,
                resource,
            },
            repeat,
        })
    }
}

fn string_field<'a>(
    object: &'a serde_json::Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, RecordIssue> {
    object
        .get(name)
        .and_then(Value::as_str)
        .ok_or(RecordIssue::MissingField(name))
}

// Durations are numbers of hours; numeric strings ("1.5") also occur in hand-edited feeds.
fn duration_from_json(value: &Value) -> Option<u16> {
    let hours = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    duration_slots_from_hours(hours)
}

/// Body of the reservation write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationPayload {
    pub date: NaiveDate,
    pub hour: String,
    pub table: ResourceId,
    /// Hours, in 0.5 increments.
    pub duration: f64,
    pub people_count: u8,
    pub selected_options: Vec<String>,
    pub contact_address: String,
    pub contact_phone: String,
}

impl ReservationPayload {
    pub fn new(
        record: &OccupancyRecord,
        people_count: u8,
        selected_options: Vec<String>,
        contact_address: impl Into<String>,
        contact_phone: impl Into<String>,
    ) -> Self {
        ReservationPayload {
            date: record.date,
            hour: record.start.to_string(),
            table: record.resource.clone(),
            duration: hours_from_duration_slots(record.duration_slots),
            people_count,
            selected_options,
            contact_address: contact_address.into(),
            contact_phone: contact_phone.into(),
        }
    }
}
