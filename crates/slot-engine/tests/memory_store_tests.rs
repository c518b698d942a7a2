//! Tests for the in-memory store: snapshots, range queries and the
//! one-scheduled-meeting-per-instant constraint.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use slot_engine::model::TimeRange;
use slot_engine::{
    BookingError, MeetingStatus, MemoryStore, NewAvailabilityRule, NewEventType, NewMeeting,
    SchedulingStore,
};

fn utc(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn t(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
}

fn populated() -> MemoryStore {
    let store = MemoryStore::new();
    let et = store
        .insert_event_type(NewEventType::new("Intro", 30, "intro"))
        .unwrap();
    let rule = NewAvailabilityRule::new(et.id, 0, t(9), t(17)).in_timezone("Europe/Paris");
    store.insert_availability_rules(vec![rule]).unwrap();
    for at in [
        "2026-03-16T11:00:00Z",
        "2026-03-16T09:00:00Z",
        "2026-03-17T09:00:00Z",
    ] {
        store
            .insert_meeting(NewMeeting::scheduled(et.id, "Ada", "ada@example.com", utc(at)))
            .unwrap();
    }
    store
}

// ── Snapshots ───────────────────────────────────────────────────────────────

#[test]
fn json_snapshot_restores_every_table() {
    let store = populated();

    let restored = MemoryStore::from_json(&store.to_json().unwrap()).unwrap();

    assert_eq!(restored.snapshot().unwrap(), store.snapshot().unwrap());
}

#[test]
fn ids_continue_after_a_restore() {
    let restored = MemoryStore::from_json(&populated().to_json().unwrap()).unwrap();

    let et = restored
        .insert_event_type(NewEventType::new("Other", 15, "other"))
        .unwrap();
    let meeting = restored
        .insert_meeting(NewMeeting::scheduled(
            et.id,
            "Grace",
            "grace@example.com",
            utc("2026-03-16T09:00:00Z"),
        ))
        .unwrap();

    assert_eq!(et.id, 2);
    assert_eq!(meeting.id, 4);
}

#[test]
fn snapshot_without_counters_continues_after_the_largest_id() {
    let json = r#"{
        "event_types": [{
            "id": 7, "name": "Intro", "duration_minutes": 30, "slug": "intro",
            "created_at": "2026-01-01T00:00:00Z", "updated_at": "2026-01-01T00:00:00Z"
        }]
    }"#;

    let store = MemoryStore::from_json(json).unwrap();
    let et = store
        .insert_event_type(NewEventType::new("Other", 15, "other"))
        .unwrap();

    assert_eq!(et.id, 8);
}

#[test]
fn rule_without_timezone_loads_as_utc() {
    let json = r#"{
        "event_types": [{
            "id": 1, "name": "Intro", "duration_minutes": 30, "slug": "intro",
            "created_at": "2026-01-01T00:00:00Z", "updated_at": "2026-01-01T00:00:00Z"
        }],
        "availability_rules": [{
            "id": 1, "event_type_id": 1, "day_of_week": 0,
            "start_time": "09:00:00", "end_time": "17:00:00"
        }]
    }"#;

    let store = MemoryStore::from_json(json).unwrap();

    let rules = store.list_availability_rules(1, Some(0)).unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].timezone, "UTC");
    assert!(store.list_meetings().unwrap().is_empty());
}

#[test]
fn malformed_snapshot_is_a_storage_error() {
    let err = MemoryStore::from_json("{ not json").unwrap_err();

    assert!(matches!(err, BookingError::Storage(msg) if msg.starts_with("invalid snapshot")));
}

// ── Ids ─────────────────────────────────────────────────────────────────────

/// Books on a second event type, deletes it, and returns the store with the
/// removed event type and meeting ids.
fn after_cascade_delete() -> (MemoryStore, u64, u64) {
    let store = populated();
    let other = store
        .insert_event_type(NewEventType::new("Other", 15, "other"))
        .unwrap();
    let meeting = store
        .insert_meeting(NewMeeting::scheduled(
            other.id,
            "Grace",
            "grace@example.com",
            utc("2026-03-18T09:00:00Z"),
        ))
        .unwrap();
    store.delete_event_type(other.id).unwrap();
    (store, other.id, meeting.id)
}

#[test]
fn ids_are_not_reused_after_a_delete() {
    let (store, deleted_et, deleted_meeting) = after_cascade_delete();

    let et = store
        .insert_event_type(NewEventType::new("Third", 45, "third"))
        .unwrap();
    let meeting = store
        .insert_meeting(NewMeeting::scheduled(
            1,
            "Linus",
            "linus@example.com",
            utc("2026-03-18T10:00:00Z"),
        ))
        .unwrap();

    assert_ne!(et.id, deleted_et);
    assert_ne!(meeting.id, deleted_meeting);
    assert!(store.find_meeting(deleted_meeting).unwrap().is_none());
}

#[test]
fn id_counters_survive_a_json_round_trip() {
    let (store, deleted_et, deleted_meeting) = after_cascade_delete();

    let restored = MemoryStore::from_json(&store.to_json().unwrap()).unwrap();
    let et = restored
        .insert_event_type(NewEventType::new("Third", 45, "third"))
        .unwrap();
    let meeting = restored
        .insert_meeting(NewMeeting::scheduled(
            1,
            "Linus",
            "linus@example.com",
            utc("2026-03-18T10:00:00Z"),
        ))
        .unwrap();

    assert_eq!(et.id, deleted_et + 1);
    assert_eq!(meeting.id, deleted_meeting + 1);
}

#[test]
fn deleted_rule_id_is_not_handed_out_again() {
    let store = populated();
    let extra = store
        .insert_availability_rules(vec![NewAvailabilityRule::new(1, 2, t(9), t(12))])
        .unwrap();
    store.delete_availability_rule(extra[0].id).unwrap();

    let next = store
        .insert_availability_rules(vec![NewAvailabilityRule::new(1, 3, t(9), t(12))])
        .unwrap();

    assert_eq!(next[0].id, extra[0].id + 1);
}

// ── Queries ─────────────────────────────────────────────────────────────────

#[test]
fn scheduled_meetings_are_sorted_by_start() {
    let store = populated();

    let starts: Vec<_> = store
        .list_scheduled_meetings(1, None)
        .unwrap()
        .into_iter()
        .map(|m| m.scheduled_at)
        .collect();

    assert_eq!(
        starts,
        [
            utc("2026-03-16T09:00:00Z"),
            utc("2026-03-16T11:00:00Z"),
            utc("2026-03-17T09:00:00Z"),
        ]
    );
}

#[test]
fn range_bounds_are_inclusive() {
    let store = populated();
    let start = utc("2026-03-16T09:00:00Z");
    let end = utc("2026-03-16T11:00:00Z");

    let inside = store
        .list_scheduled_meetings(1, Some(TimeRange::new(start, end)))
        .unwrap();
    let narrower = store
        .list_scheduled_meetings(
            1,
            Some(TimeRange::new(start, end - Duration::nanoseconds(1))),
        )
        .unwrap();

    assert_eq!(inside.len(), 2);
    assert_eq!(narrower.len(), 1);
}

#[test]
fn cancelled_meetings_are_not_scheduled() {
    let store = populated();

    store
        .update_meeting_status(1, MeetingStatus::Cancelled)
        .unwrap();

    assert_eq!(store.list_scheduled_meetings(1, None).unwrap().len(), 2);
    assert_eq!(store.list_meetings().unwrap().len(), 3);
}

#[test]
fn rules_can_be_filtered_by_day() {
    let store = populated();

    assert_eq!(store.list_availability_rules(1, Some(0)).unwrap().len(), 1);
    assert!(store.list_availability_rules(1, Some(3)).unwrap().is_empty());
}

// ── Constraints ─────────────────────────────────────────────────────────────

#[test]
fn second_scheduled_meeting_at_same_instant_is_refused() {
    let store = populated();

    let err = store
        .insert_meeting(NewMeeting::scheduled(
            1,
            "Grace",
            "grace@example.com",
            utc("2026-03-16T09:00:00Z"),
        ))
        .unwrap_err();

    assert_eq!(
        err,
        BookingError::SlotTaken {
            event_type_id: 1,
            scheduled_at: utc("2026-03-16T09:00:00Z"),
        }
    );
}

#[test]
fn cancelled_meeting_may_share_an_instant() {
    // Meeting 1 sits at 11:00.
    let store = populated();
    let at = utc("2026-03-16T11:00:00Z");

    store
        .insert_meeting(NewMeeting {
            status: MeetingStatus::Cancelled,
            ..NewMeeting::scheduled(1, "Grace", "grace@example.com", at)
        })
        .unwrap();
    store
        .update_meeting_status(1, MeetingStatus::Cancelled)
        .unwrap();
    store
        .insert_meeting(NewMeeting::scheduled(1, "Linus", "linus@example.com", at))
        .unwrap();

    // Reinstating the original would now double-book the instant.
    assert!(matches!(
        store.update_meeting_status(1, MeetingStatus::Scheduled),
        Err(BookingError::SlotTaken { .. })
    ));
}

#[test]
fn meeting_for_unknown_event_type_is_refused() {
    let store = MemoryStore::new();

    let err = store
        .insert_meeting(NewMeeting::scheduled(
            9,
            "Ada",
            "ada@example.com",
            utc("2026-03-16T09:00:00Z"),
        ))
        .unwrap_err();

    assert!(matches!(err, BookingError::NotFound { .. }));
}

#[test]
fn bulk_rule_insert_is_all_or_nothing() {
    let store = populated();

    let err = store
        .insert_availability_rules(vec![
            NewAvailabilityRule::new(1, 1, t(9), t(17)),
            NewAvailabilityRule::new(42, 1, t(9), t(17)),
        ])
        .unwrap_err();

    assert!(matches!(err, BookingError::NotFound { .. }));
    assert!(store.list_availability_rules(1, Some(1)).unwrap().is_empty());
}
