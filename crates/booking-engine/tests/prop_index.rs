//! Property-based tests for index construction and slot conversion.

use booking_engine::loader::build_index;
use booking_engine::{DateWindow, ResourceId, Slot, TimeSlotIndex};
use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_hour() -> impl Strategy<Value = (u16, bool)> {
    (12u16..=23, any::<bool>())
}

fn arb_table() -> impl Strategy<Value = Value> {
    prop_oneof![
        (1u32..=12).prop_map(|n| json!(n)),
        (1u32..=12).prop_map(|n| json!(n.to_string())),
        Just(json!("bar")),
    ]
}

/// A feed record dated within the first week of March 2024.
fn arb_record() -> impl Strategy<Value = Value> {
    (1u32..=7, arb_hour(), 1u16..=8, arb_table(), any::<bool>()).prop_map(
        |(day, (hour, half), half_hours, table, daily)| {
            json!({
                "date": format!("2024-03-{:02}", day),
                "hour": format!("{}:{}", hour, if half { "30" } else { "00" }),
                "duration": f64::from(half_hours) / 2.0,
                "table": table,
                "repeat": if daily { json!("daily") } else { json!(false) },
            })
        },
    )
}

fn window() -> DateWindow {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    DateWindow::new(start, start + Days::new(6)).unwrap()
}

fn build(records: &[Value]) -> TimeSlotIndex {
    build_index(1, window(), [records, &[], &[]]).0
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn feed_order_does_not_change_the_index(records in prop::collection::vec(arb_record(), 0..20)) {
        let mut reversed = records.clone();
        reversed.reverse();
        prop_assert_eq!(build(&records), build(&reversed));
    }

    #[test]
    fn duplicated_feed_builds_the_same_index(records in prop::collection::vec(arb_record(), 0..20)) {
        let mut doubled = records.clone();
        doubled.extend(records.iter().cloned());
        prop_assert_eq!(build(&records), build(&doubled));
    }

    #[test]
    fn splitting_records_across_feeds_builds_the_same_index(
        records in prop::collection::vec(arb_record(), 0..20),
        split in 0usize..20,
    ) {
        let split = split.min(records.len());
        let (head, tail) = records.split_at(split);
        let (split_index, report) = build_index(1, window(), [head, &[], tail]);
        prop_assert_eq!(split_index, build(&records));
        prop_assert_eq!(report.applied, records.len());
    }

    #[test]
    fn daily_records_occupy_every_window_date(
        (hour, half) in arb_hour(),
        half_hours in 1u16..=8,
        table in 1u32..=12,
    ) {
        let minutes = if half { "30" } else { "00" };
        let record = json!({
            "date": "2020-01-01",
            "hour": format!("{}:{}", hour, minutes),
            "duration": f64::from(half_hours) / 2.0,
            "table": table,
            "repeat": "daily",
        });
        let index = build(&[record]);
        let start = Slot::from_half_hours(hour * 2 + u16::from(half));
        let resource = ResourceId::Numeric(table);

        for date in window().dates() {
            for slot in start.span(half_hours) {
                prop_assert!(index.is_occupied(date, slot, &resource));
            }
            prop_assert!(!index.is_occupied(date, start.offset(half_hours), &resource));
        }
    }

    #[test]
    fn slot_display_parses_back(half_hours in 0u16..48) {
        let slot = Slot::from_half_hours(half_hours);
        prop_assert_eq!(Slot::parse_hour(&slot.to_string()), Some(slot));
        prop_assert_eq!(Slot::from_display_hour(slot.display_hour()), Some(slot));
    }
}
