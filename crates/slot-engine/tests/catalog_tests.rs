//! Tests for event type and availability rule management.

use chrono::{DateTime, NaiveTime, Utc};
use slot_engine::catalog;
use slot_engine::{
    AvailabilityRuleUpdate, BookingError, Entity, EventTypeUpdate, MemoryStore, NewAvailabilityRule,
    NewEventType, NewMeeting, SchedulingStore,
};

fn t(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

fn utc(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

// ── Event types ─────────────────────────────────────────────────────────────

#[test]
fn create_and_fetch_by_id_and_slug() {
    let store = MemoryStore::new();

    let et = catalog::create_event_type(&store, NewEventType::new("Intro", 30, "intro")).unwrap();

    assert_eq!(catalog::get_event_type(&store, et.id).unwrap(), et);
    assert_eq!(catalog::get_event_type_by_slug(&store, "intro").unwrap(), et);
}

#[test]
fn duplicate_slug_is_rejected() {
    let store = MemoryStore::new();
    catalog::create_event_type(&store, NewEventType::new("Intro", 30, "intro")).unwrap();

    let err = catalog::create_event_type(&store, NewEventType::new("Other", 15, "intro"))
        .unwrap_err();

    assert_eq!(err, BookingError::DuplicateSlug("intro".to_string()));
    assert_eq!(store.list_event_types().unwrap().len(), 1);
}

#[test]
fn zero_duration_is_rejected() {
    let store = MemoryStore::new();

    let err =
        catalog::create_event_type(&store, NewEventType::new("Intro", 0, "intro")).unwrap_err();

    assert!(matches!(err, BookingError::InvalidEventType(_)));
}

#[test]
fn slug_must_be_url_safe() {
    let store = MemoryStore::new();

    for slug in ["", "Has Space", "UPPER", "semi;colon"] {
        let err = catalog::create_event_type(&store, NewEventType::new("Intro", 30, slug))
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidEventType(_)), "{:?}", slug);
    }
    catalog::create_event_type(&store, NewEventType::new("Intro", 30, "30min_intro-v2")).unwrap();
}

#[test]
fn digit_only_slug_is_rejected() {
    let store = MemoryStore::new();
    let et = catalog::create_event_type(&store, NewEventType::new("Intro", 30, "intro")).unwrap();

    let created = catalog::create_event_type(&store, NewEventType::new("Other", 30, "123"));
    let updated = catalog::update_event_type(
        &store,
        et.id,
        EventTypeUpdate {
            slug: Some("42".to_string()),
            ..EventTypeUpdate::default()
        },
    );

    assert!(matches!(
        created,
        Err(BookingError::InvalidEventType(msg)) if msg.contains("non-digit")
    ));
    assert!(matches!(updated, Err(BookingError::InvalidEventType(_))));
}

#[test]
fn update_to_a_taken_slug_is_rejected() {
    let store = MemoryStore::new();
    catalog::create_event_type(&store, NewEventType::new("A", 30, "a")).unwrap();
    let b = catalog::create_event_type(&store, NewEventType::new("B", 30, "b")).unwrap();

    let err = catalog::update_event_type(
        &store,
        b.id,
        EventTypeUpdate {
            slug: Some("a".to_string()),
            ..EventTypeUpdate::default()
        },
    )
    .unwrap_err();

    assert_eq!(err, BookingError::DuplicateSlug("a".to_string()));
}

#[test]
fn update_keeping_own_slug_is_allowed() {
    let store = MemoryStore::new();
    let et = catalog::create_event_type(&store, NewEventType::new("A", 30, "a")).unwrap();

    let updated = catalog::update_event_type(
        &store,
        et.id,
        EventTypeUpdate {
            name: Some("Renamed".to_string()),
            slug: Some("a".to_string()),
            duration_minutes: Some(45),
        },
    )
    .unwrap();

    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.duration_minutes, 45);
    assert_eq!(updated.slug, "a");
    assert_eq!(updated.created_at, et.created_at);
}

#[test]
fn update_of_missing_event_type_is_not_found() {
    let store = MemoryStore::new();

    let err = catalog::update_event_type(&store, 5, EventTypeUpdate::default()).unwrap_err();

    assert_eq!(
        err,
        BookingError::NotFound {
            entity: Entity::EventType,
            key: "5".to_string(),
        }
    );
}

#[test]
fn delete_cascades_to_rules_and_meetings() {
    let store = MemoryStore::new();
    let keep = catalog::create_event_type(&store, NewEventType::new("Keep", 30, "keep")).unwrap();
    let drop = catalog::create_event_type(&store, NewEventType::new("Drop", 30, "drop")).unwrap();
    for et in [&keep, &drop] {
        catalog::create_rule(&store, NewAvailabilityRule::new(et.id, 0, t(9, 0), t(17, 0)))
            .unwrap();
        store
            .insert_meeting(NewMeeting::scheduled(
                et.id,
                "Ada",
                "ada@example.com",
                utc("2026-03-16T09:00:00Z"),
            ))
            .unwrap();
    }

    catalog::delete_event_type(&store, drop.id).unwrap();

    assert!(store.find_event_type(drop.id).unwrap().is_none());
    assert!(store.list_availability_rules(drop.id, None).unwrap().is_empty());
    let meetings = store.list_meetings().unwrap();
    assert_eq!(meetings.len(), 1);
    assert_eq!(meetings[0].event_type_id, keep.id);
    assert_eq!(store.list_availability_rules(keep.id, None).unwrap().len(), 1);
}

// ── Availability rules ──────────────────────────────────────────────────────

#[test]
fn rule_defaults_to_utc() {
    let store = MemoryStore::new();
    let et = catalog::create_event_type(&store, NewEventType::new("Intro", 30, "intro")).unwrap();

    let rule =
        catalog::create_rule(&store, NewAvailabilityRule::new(et.id, 2, t(9, 0), t(12, 0)))
            .unwrap();

    assert_eq!(rule.timezone, "UTC");
    assert_eq!(rule.day_of_week, 2);
    assert_eq!(catalog::list_rules(&store, et.id).unwrap(), vec![rule]);
}

#[test]
fn day_of_week_out_of_range_is_rejected() {
    let store = MemoryStore::new();
    let et = catalog::create_event_type(&store, NewEventType::new("Intro", 30, "intro")).unwrap();

    let err = catalog::create_rule(&store, NewAvailabilityRule::new(et.id, 7, t(9, 0), t(12, 0)))
        .unwrap_err();

    assert_eq!(
        err,
        BookingError::InvalidRule("day_of_week must be between 0 and 6".to_string())
    );
}

#[test]
fn start_must_precede_end() {
    let store = MemoryStore::new();
    let et = catalog::create_event_type(&store, NewEventType::new("Intro", 30, "intro")).unwrap();

    for (start, end) in [(t(12, 0), t(9, 0)), (t(9, 0), t(9, 0))] {
        let err = catalog::create_rule(&store, NewAvailabilityRule::new(et.id, 0, start, end))
            .unwrap_err();
        assert_eq!(
            err,
            BookingError::InvalidRule("start_time must be before end_time".to_string())
        );
    }
}

#[test]
fn unknown_rule_timezone_is_rejected() {
    let store = MemoryStore::new();
    let et = catalog::create_event_type(&store, NewEventType::new("Intro", 30, "intro")).unwrap();

    let err = catalog::create_rule(
        &store,
        NewAvailabilityRule::new(et.id, 0, t(9, 0), t(12, 0)).in_timezone("Nowhere/City"),
    )
    .unwrap_err();

    assert_eq!(err, BookingError::InvalidTimezone("Nowhere/City".to_string()));
}

#[test]
fn rule_for_missing_event_type_is_not_found() {
    let store = MemoryStore::new();

    let err = catalog::create_rule(&store, NewAvailabilityRule::new(3, 0, t(9, 0), t(12, 0)))
        .unwrap_err();

    assert!(matches!(
        err,
        BookingError::NotFound {
            entity: Entity::EventType,
            ..
        }
    ));
}

#[test]
fn bulk_create_writes_nothing_when_one_rule_is_invalid() {
    let store = MemoryStore::new();
    let et = catalog::create_event_type(&store, NewEventType::new("Intro", 30, "intro")).unwrap();

    let err = catalog::create_rules(
        &store,
        vec![
            NewAvailabilityRule::new(et.id, 0, t(9, 0), t(12, 0)),
            NewAvailabilityRule::new(et.id, 1, t(13, 0), t(12, 0)),
        ],
    )
    .unwrap_err();

    assert!(matches!(err, BookingError::InvalidRule(_)));
    assert!(catalog::list_rules(&store, et.id).unwrap().is_empty());
}

#[test]
fn bulk_create_returns_rules_in_order() {
    let store = MemoryStore::new();
    let et = catalog::create_event_type(&store, NewEventType::new("Intro", 30, "intro")).unwrap();

    let created = catalog::create_rules(
        &store,
        (0..5)
            .map(|day| NewAvailabilityRule::new(et.id, day, t(9, 0), t(17, 0)))
            .collect(),
    )
    .unwrap();

    let days: Vec<u8> = created.iter().map(|r| r.day_of_week).collect();
    assert_eq!(days, [0, 1, 2, 3, 4]);
    assert!(created.windows(2).all(|w| w[0].id < w[1].id));
}

#[test]
fn update_validates_the_merged_rule() {
    let store = MemoryStore::new();
    let et = catalog::create_event_type(&store, NewEventType::new("Intro", 30, "intro")).unwrap();
    let rule = catalog::create_rule(&store, NewAvailabilityRule::new(et.id, 0, t(9, 0), t(12, 0)))
        .unwrap();

    // Moving only the end before the stored start must fail.
    let err = catalog::update_rule(
        &store,
        rule.id,
        AvailabilityRuleUpdate {
            end_time: Some(t(8, 0)),
            ..AvailabilityRuleUpdate::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, BookingError::InvalidRule(_)));
    assert_eq!(store.find_availability_rule(rule.id).unwrap(), Some(rule.clone()));

    let updated = catalog::update_rule(
        &store,
        rule.id,
        AvailabilityRuleUpdate {
            day_of_week: Some(4),
            timezone: Some("Europe/Berlin".to_string()),
            ..AvailabilityRuleUpdate::default()
        },
    )
    .unwrap();
    assert_eq!(updated.day_of_week, 4);
    assert_eq!(updated.timezone, "Europe/Berlin");
    assert_eq!(updated.start_time, t(9, 0));
}

#[test]
fn delete_and_clear_rules() {
    let store = MemoryStore::new();
    let et = catalog::create_event_type(&store, NewEventType::new("Intro", 30, "intro")).unwrap();
    let rules = catalog::create_rules(
        &store,
        (0..3)
            .map(|day| NewAvailabilityRule::new(et.id, day, t(9, 0), t(17, 0)))
            .collect(),
    )
    .unwrap();

    catalog::delete_rule(&store, rules[0].id).unwrap();
    assert!(matches!(
        catalog::delete_rule(&store, rules[0].id),
        Err(BookingError::NotFound {
            entity: Entity::AvailabilityRule,
            ..
        })
    ));

    assert_eq!(catalog::clear_rules(&store, et.id).unwrap(), 2);
    assert!(catalog::list_rules(&store, et.id).unwrap().is_empty());
}

#[test]
fn listing_rules_of_missing_event_type_is_not_found() {
    let store = MemoryStore::new();

    assert!(matches!(
        catalog::list_rules(&store, 1),
        Err(BookingError::NotFound { .. })
    ));
}
