//! In-memory backend shared by the engine integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use booking_engine::error::{BookingError, Feed, Result};
use booking_engine::{
    AvailabilityLoader, AvailabilityStore, BookingBackend, BookingConfig, ReservationPayload,
};
use chrono::NaiveDate;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::Notify;

#[derive(Default)]
pub struct FakeBackend {
    pub reservations: Mutex<Vec<Value>>,
    pub one_off: Mutex<Vec<Value>>,
    pub recurring: Mutex<Vec<Value>>,
    failing: Mutex<HashSet<Feed>>,
    load_pause: Mutex<Option<Arc<Notify>>>,
    submit_pause: Mutex<Option<Arc<Notify>>>,
    pub load_calls: AtomicUsize,
    pub submitted: Mutex<Vec<ReservationPayload>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_reservations(&self, records: Vec<Value>) {
        *self.reservations.lock() = records;
    }

    pub fn set_one_off(&self, records: Vec<Value>) {
        *self.one_off.lock() = records;
    }

    pub fn set_recurring(&self, records: Vec<Value>) {
        *self.recurring.lock() = records;
    }

    pub fn fail(&self, feed: Feed) {
        self.failing.lock().insert(feed);
    }

    pub fn recover(&self, feed: Feed) {
        self.failing.lock().remove(&feed);
    }

    /// The next reservations fetch waits until the returned handle is notified.
    pub fn pause_next_load(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.load_pause.lock() = Some(Arc::clone(&gate));
        gate
    }

    /// The next reservation write waits until the returned handle is notified.
    pub fn pause_next_submit(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.submit_pause.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    fn check(&self, feed: Feed) -> Result<()> {
        if self.failing.lock().contains(&feed) {
            return Err(BookingError::Transport {
                feed,
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BookingBackend for FakeBackend {
    async fn fetch_reservations(&self, _start: NaiveDate, _end: NaiveDate) -> Result<Vec<Value>> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        let pause = self.load_pause.lock().take();
        if let Some(gate) = pause {
            gate.notified().await;
        }
        self.check(Feed::Reservations)?;
        Ok(self.reservations.lock().clone())
    }

    async fn fetch_one_off_events(&self, _start: NaiveDate, _end: NaiveDate) -> Result<Vec<Value>> {
        self.check(Feed::OneOffEvents)?;
        Ok(self.one_off.lock().clone())
    }

    async fn fetch_recurring_events(&self, _end: NaiveDate) -> Result<Vec<Value>> {
        self.check(Feed::RecurringEvents)?;
        Ok(self.recurring.lock().clone())
    }

    async fn submit_reservation(&self, payload: &ReservationPayload) -> Result<()> {
        let pause = self.submit_pause.lock().take();
        if let Some(gate) = pause {
            gate.notified().await;
        }
        self.check(Feed::Submission)?;
        self.submitted.lock().push(payload.clone());
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

pub fn record(date: &str, hour: &str, duration: f64, table: Value) -> Value {
    json!({ "date": date, "hour": hour, "duration": duration, "table": table, "repeat": false })
}

pub fn daily(date: &str, hour: &str, duration: f64, table: Value) -> Value {
    json!({ "date": date, "hour": hour, "duration": duration, "table": table, "repeat": "daily" })
}

pub fn loader_for(backend: &Arc<FakeBackend>) -> (AvailabilityLoader, Arc<AvailabilityStore>) {
    let store = Arc::new(AvailabilityStore::default());
    let loader = AvailabilityLoader::new(
        Arc::clone(backend) as Arc<dyn BookingBackend>,
        Arc::clone(&store),
        BookingConfig::default(),
    );
    (loader, store)
}
