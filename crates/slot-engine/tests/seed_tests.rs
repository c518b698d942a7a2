//! Tests for the demo data set.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use slot_engine::seed::seed_demo;
use slot_engine::{BookingService, MeetingStatus, MemoryStore, SchedulingStore};

fn utc(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

#[test]
fn seeds_three_event_types_with_weekday_rules() {
    let store = MemoryStore::new();

    let types = seed_demo(&store, utc("2026-03-16T12:00:00Z")).unwrap();

    let slugs: Vec<&str> = types.iter().map(|et| et.slug.as_str()).collect();
    assert_eq!(
        slugs,
        ["30min-meeting", "1hour-consultation", "15min-quick-chat"]
    );
    let rule_counts: Vec<usize> = types
        .iter()
        .map(|et| store.list_availability_rules(et.id, None).unwrap().len())
        .collect();
    assert_eq!(rule_counts, [5, 3, 5]);
}

#[test]
fn seeded_meetings_straddle_now() {
    let now = utc("2026-03-16T12:00:00Z");
    let store = Arc::new(MemoryStore::new());
    seed_demo(&*store, now).unwrap();
    let service = BookingService::new(store);

    let upcoming: Vec<String> = service
        .upcoming_meetings(now)
        .unwrap()
        .into_iter()
        .map(|m| m.invitee_name)
        .collect();
    let past = service.past_meetings(now).unwrap();

    assert_eq!(upcoming, ["John Doe", "Jane Smith"]);
    assert_eq!(past.len(), 2);
    assert!(past.iter().all(|m| m.status == MeetingStatus::Completed));
    assert_eq!(past[0].scheduled_at, utc("2026-03-15T11:00:00Z"));
}

#[test]
fn seeded_meeting_blocks_its_slot() {
    // John Doe is booked 2026-03-17 10:00 on the 30 minute type.
    let now = utc("2026-03-16T12:00:00Z");
    let store = Arc::new(MemoryStore::new());
    let types = seed_demo(&*store, now).unwrap();
    let service = BookingService::new(store);

    let slots = service
        .resolve_slots(types[0].id, "2026-03-17".parse().unwrap(), "UTC")
        .unwrap();

    assert_eq!(slots.len(), 15);
    assert!(!slots.contains(&utc("2026-03-17T10:00:00Z")));
}
