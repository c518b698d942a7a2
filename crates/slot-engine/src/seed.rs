//! Demo data: three event types with weekday availability and a handful of
//! meetings around `now`.

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::catalog;
use crate::error::Result;
use crate::model::{EventType, MeetingStatus, NewAvailabilityRule, NewEventType, NewMeeting};
use crate::store::SchedulingStore;

const WEEKDAYS: [u8; 5] = [0, 1, 2, 3, 4];

fn hour(h: i64) -> NaiveTime {
    NaiveTime::MIN + Duration::hours(h)
}

/// `hour_of_day`:00 UTC on the day `days` away from `now`.
fn day_at(now: DateTime<Utc>, days: i64, hour_of_day: i64) -> DateTime<Utc> {
    let day = (now + Duration::days(days)).date_naive();
    day.and_time(NaiveTime::MIN).and_utc() + Duration::hours(hour_of_day)
}

fn seed_type<S>(
    store: &S,
    new: NewEventType,
    days: &[u8],
    start_hour: i64,
    end_hour: i64,
) -> Result<EventType>
where
    S: SchedulingStore + ?Sized,
{
    let event_type = catalog::create_event_type(store, new)?;
    let rules = days
        .iter()
        .map(|&day| NewAvailabilityRule::new(event_type.id, day, hour(start_hour), hour(end_hour)))
        .collect();
    catalog::create_rules(store, rules)?;
    Ok(event_type)
}

/// Populate `store` with the demo event types, rules and meetings.
///
/// Meetings are written directly so that past ones can carry a stored
/// Completed status.
pub fn seed_demo<S>(store: &S, now: DateTime<Utc>) -> Result<Vec<EventType>>
where
    S: SchedulingStore + ?Sized,
{
    let intro = seed_type(
        store,
        NewEventType::new("30 Minute Meeting", 30, "30min-meeting"),
        &WEEKDAYS,
        9,
        17,
    )?;
    let consult = seed_type(
        store,
        NewEventType::new("1 Hour Consultation", 60, "1hour-consultation"),
        &[0, 2, 4],
        10,
        15,
    )?;
    let chat = seed_type(
        store,
        NewEventType::new("15 Minute Quick Chat", 15, "15min-quick-chat"),
        &WEEKDAYS,
        8,
        18,
    )?;

    let meetings = [
        (
            intro.id,
            "John Doe",
            "john.doe@example.com",
            day_at(now, 1, 10),
            MeetingStatus::Scheduled,
        ),
        (
            consult.id,
            "Jane Smith",
            "jane.smith@example.com",
            day_at(now, 2, 14),
            MeetingStatus::Scheduled,
        ),
        (
            intro.id,
            "Bob Johnson",
            "bob.johnson@example.com",
            day_at(now, -1, 11),
            MeetingStatus::Completed,
        ),
        (
            chat.id,
            "Alice Williams",
            "alice.williams@example.com",
            day_at(now, -7, 15),
            MeetingStatus::Completed,
        ),
    ];
    for (event_type_id, name, email, scheduled_at, status) in meetings {
        store.insert_meeting(NewMeeting {
            status,
            ..NewMeeting::scheduled(event_type_id, name, email, scheduled_at)
        })?;
    }

    Ok(vec![intro, consult, chat])
}
