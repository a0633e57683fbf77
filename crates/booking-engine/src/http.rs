//! JSON-over-HTTP implementation of [`BookingBackend`].
//!
//! Query parameters follow the json-server conventions the booking API uses:
//! `date_gte` / `date_lte` bound dates, `repeat=false` selects one-off events
//! and `repeat_ne=false` selects repeating ones.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::backend::BookingBackend;
use crate::config::BookingConfig;
use crate::error::{BookingError, Feed, Result};
use crate::model::{ReservationPayload, DATE_FORMAT};

const DATE_START_PARAM: &str = "date_gte";
const DATE_END_PARAM: &str = "date_lte";

/// Booking API client.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    bookings_url: String,
    events_url: String,
}

impl HttpBackend {
    pub fn new(config: &BookingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| BookingError::Config(format!("HTTP client: {e}")))?;
        Ok(HttpBackend {
            client,
            bookings_url: config.bookings_url(),
            events_url: config.events_url(),
        })
    }

    async fn get_records(
        &self,
        feed: Feed,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<Value>> {
        debug!(%feed, url, ?query, "fetching feed");
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| BookingError::transport(feed, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BookingError::transport(feed, format!("HTTP {status}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| BookingError::transport(feed, format!("invalid JSON body: {e}")))?;

        match body {
            Value::Array(records) => {
                debug!(%feed, count = records.len(), "feed fetched");
                Ok(records)
            }
            other => Err(BookingError::transport(
                feed,
                format!("expected a JSON array, got {}", json_kind(&other)),
            )),
        }
    }
}

#[async_trait]
impl BookingBackend for HttpBackend {
    async fn fetch_reservations(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        let query = [
            (DATE_START_PARAM, fmt_date(start)),
            (DATE_END_PARAM, fmt_date(end)),
        ];
        self.get_records(Feed::Reservations, &self.bookings_url, &query)
            .await
    }

    async fn fetch_one_off_events(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        let query = [
            ("repeat", "false".to_string()),
            (DATE_START_PARAM, fmt_date(start)),
            (DATE_END_PARAM, fmt_date(end)),
        ];
        self.get_records(Feed::OneOffEvents, &self.events_url, &query)
            .await
    }

    async fn fetch_recurring_events(&self, end: NaiveDate) -> Result<Vec<Value>> {
        let query = [
            ("repeat_ne", "false".to_string()),
            (DATE_END_PARAM, fmt_date(end)),
        ];
        self.get_records(Feed::RecurringEvents, &self.events_url, &query)
            .await
    }

    async fn submit_reservation(&self, payload: &ReservationPayload) -> Result<()> {
        debug!(url = %self.bookings_url, table = %payload.table, "submitting reservation");
        let response = self
            .client
            .post(&self.bookings_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| BookingError::transport(Feed::Submission, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(BookingError::transport(
                Feed::Submission,
                format!("HTTP {status}"),
            ))
        }
    }
}

fn fmt_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
