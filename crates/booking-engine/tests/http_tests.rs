//! Tests for the HTTP backend against a mock booking API.

use std::sync::Arc;

use booking_engine::error::{BookingError, Feed};
use booking_engine::{
    AvailabilityLoader, AvailabilityStore, BookingBackend, BookingConfig, DateWindow, HttpBackend,
    OccupancyRecord, ReservationPayload, ResourceId, Slot,
};
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

fn backend_for(server: &MockServer) -> HttpBackend {
    let config = BookingConfig {
        base_url: server.uri(),
        ..BookingConfig::default()
    };
    HttpBackend::new(&config).unwrap()
}

#[tokio::test]
async fn reservations_are_filtered_by_date_range() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/booking"))
        .and(query_param("date_gte", "2024-01-01"))
        .and(query_param("date_lte", "2024-01-14"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "date": "2024-01-02", "hour": "18:00", "duration": 1, "table": 1 }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let records = backend_for(&server)
        .fetch_reservations(date("2024-01-01"), date("2024-01-14"))
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn event_feeds_use_repeat_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/event"))
        .and(query_param("repeat", "false"))
        .and(query_param("date_gte", "2024-01-01"))
        .and(query_param("date_lte", "2024-01-14"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/event"))
        .and(query_param("repeat_ne", "false"))
        .and(query_param("date_lte", "2024-01-14"))
        .and(query_param_is_missing("date_gte"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "date": "2023-12-01", "hour": "12:00", "duration": 1, "table": 2, "repeat": "daily" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let one_off = backend
        .fetch_one_off_events(date("2024-01-01"), date("2024-01-14"))
        .await
        .unwrap();
    let recurring = backend
        .fetch_recurring_events(date("2024-01-14"))
        .await
        .unwrap();

    assert!(one_off.is_empty());
    assert_eq!(recurring.len(), 1);
}

#[tokio::test]
async fn error_status_is_a_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/booking"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .fetch_reservations(date("2024-01-01"), date("2024-01-02"))
        .await
        .unwrap_err();

    match err {
        BookingError::Transport { feed, message } => {
            assert_eq!(feed, Feed::Reservations);
            assert!(message.contains("503"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn non_array_body_is_a_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/booking"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "nope" })))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .fetch_reservations(date("2024-01-01"), date("2024-01-02"))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("expected a JSON array"), "{err}");
}

#[tokio::test]
async fn reservation_is_posted_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/booking"))
        .and(body_json(json!({
            "date": "2024-02-10",
            "hour": "19:00",
            "table": 3,
            "duration": 1.0,
            "peopleCount": 2,
            "selectedOptions": [],
            "contactAddress": "Main Street 1",
            "contactPhone": "555-0100"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 1 })))
        .expect(1)
        .mount(&server)
        .await;

    let record = OccupancyRecord {
        date: date("2024-02-10"),
        start: Slot::at_hour(19),
        duration_slots: 2,
        resource: ResourceId::Numeric(3),
    };
    let payload = ReservationPayload::new(&record, 2, vec![], "Main Street 1", "555-0100");

    backend_for(&server)
        .submit_reservation(&payload)
        .await
        .unwrap();
}

#[tokio::test]
async fn rejected_reservation_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/booking"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let record = OccupancyRecord {
        date: date("2024-02-10"),
        start: Slot::at_hour(19),
        duration_slots: 2,
        resource: ResourceId::Numeric(3),
    };
    let payload = ReservationPayload::new(&record, 2, vec![], "", "");

    let err = backend_for(&server)
        .submit_reservation(&payload)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BookingError::Transport {
            feed: Feed::Submission,
            ..
        }
    ));
}

#[tokio::test]
async fn loader_builds_index_from_http_feeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/booking"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "date": "2024-01-02", "hour": "18:00", "duration": 1, "table": "1" }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/event"))
        .and(query_param("repeat", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/event"))
        .and(query_param("repeat_ne", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "date": "2023-12-01",
                "hour": "12:00",
                "duration": 0.5,
                "table": 2,
                "repeat": "daily"
            }
        ])))
        .mount(&server)
        .await;

    let config = BookingConfig {
        base_url: server.uri(),
        ..BookingConfig::default()
    };
    let store = Arc::new(AvailabilityStore::default());
    let backend: Arc<dyn BookingBackend> = Arc::new(HttpBackend::new(&config).unwrap());
    let loader = AvailabilityLoader::new(backend, Arc::clone(&store), config);

    let window = DateWindow::new(date("2024-01-01"), date("2024-01-02")).unwrap();
    assert!(loader.load(window).await.unwrap().is_published());

    let index = store.current();
    let (one, two) = (ResourceId::Numeric(1), ResourceId::Numeric(2));
    assert!(index.is_occupied(date("2024-01-02"), Slot::at_hour(18), &one));
    assert!(index.is_occupied(date("2024-01-01"), Slot::at_hour(12), &two));
    assert!(index.is_occupied(date("2024-01-02"), Slot::at_hour(12), &two));
    assert!(!index.is_occupied(date("2024-01-01"), Slot::from_half_hours(25), &two));
}
