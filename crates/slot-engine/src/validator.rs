//! Conflict Validator: decide whether one proposed booking is acceptable.
//!
//! A proposal passes when the event type exists, the requested duration equals
//! the event type's duration, the interval is fully contained in at least one
//! availability window (see [`Containment`]), and it overlaps no Scheduled
//! meeting. The checks run in that order and the first failure is reported.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conflict::{booked_intervals, find_conflicts, Conflict};
use crate::error::Result;
use crate::model::{AvailabilityRule, EventType, EventTypeId, TimeRange};
use crate::options::{Containment, EngineOptions};
use crate::resolver::rule_window;
use crate::store::SchedulingStore;
use crate::time::{self, weekday_index};

/// Why a proposed booking was turned down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    UnknownEventType {
        event_type_id: EventTypeId,
    },
    DurationMismatch {
        requested_minutes: u32,
        expected_minutes: u32,
    },
    /// `day_of_week` is the UTC weekday under raw time-of-day containment,
    /// and the weekday in the rules' zone under rule-local containment.
    NoRulesForDay {
        day_of_week: u8,
    },
    OutsideAvailability,
    Conflict(Conflict),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::UnknownEventType { event_type_id } => {
                write!(f, "event type {} does not exist", event_type_id)
            }
            Rejection::DurationMismatch {
                requested_minutes,
                expected_minutes,
            } => write!(
                f,
                "requested {} minutes but the event type lasts {} minutes",
                requested_minutes, expected_minutes
            ),
            Rejection::NoRulesForDay { day_of_week } => {
                write!(f, "no availability on day {}", day_of_week)
            }
            Rejection::OutsideAvailability => {
                f.write_str("not fully inside any availability window")
            }
            Rejection::Conflict(conflict) => write!(f, "{}", conflict),
        }
    }
}

/// Outcome of [`check_slot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "detail", rename_all = "snake_case")]
pub enum Verdict {
    Available,
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_available(&self) -> bool {
        matches!(self, Verdict::Available)
    }
}

/// Validate a proposed booking and explain the outcome.
///
/// `scheduled_at` may carry any offset; it is normalized to UTC first.
///
/// # Errors
/// Only store failures and unknown rule timezones are errors; every business
/// reason for refusal is a [`Verdict::Rejected`].
pub fn check_slot<S, Z>(
    store: &S,
    event_type_id: EventTypeId,
    scheduled_at: DateTime<Z>,
    requested_duration_minutes: u32,
    options: &EngineOptions,
) -> Result<Verdict>
where
    S: SchedulingStore + ?Sized,
    Z: TimeZone,
{
    let start = scheduled_at.with_timezone(&Utc);

    let Some(event_type) = store.find_event_type(event_type_id)? else {
        return Ok(reject(Rejection::UnknownEventType { event_type_id }));
    };

    if requested_duration_minutes != event_type.duration_minutes {
        return Ok(reject(Rejection::DurationMismatch {
            requested_minutes: requested_duration_minutes,
            expected_minutes: event_type.duration_minutes,
        }));
    }

    let end = start + event_type.duration();

    let contained = match options.containment {
        Containment::RawTimeOfDay => {
            let utc_day = weekday_index(start.date_naive());
            let rules = store.list_availability_rules(event_type.id, Some(utc_day))?;
            if rules.is_empty() {
                return Ok(reject(Rejection::NoRulesForDay {
                    day_of_week: utc_day,
                }));
            }
            contained_raw(&rules, start, end)
        }
        Containment::RuleLocal => {
            let rules = store.list_availability_rules(event_type.id, None)?;
            let todays = rules_on_local_day(&rules, start)?;
            if todays.is_empty() {
                return Ok(reject(Rejection::NoRulesForDay {
                    day_of_week: local_day(&rules, start)?,
                }));
            }
            contained_local(&todays, start, end, options)?
        }
    };
    if !contained {
        return Ok(reject(Rejection::OutsideAvailability));
    }

    if let Some(conflict) = first_conflict(store, &event_type, start, end)? {
        return Ok(reject(Rejection::Conflict(conflict)));
    }

    Ok(Verdict::Available)
}

/// Boolean form of [`check_slot`].
pub fn is_available<S, Z>(
    store: &S,
    event_type_id: EventTypeId,
    scheduled_at: DateTime<Z>,
    requested_duration_minutes: u32,
    options: &EngineOptions,
) -> Result<bool>
where
    S: SchedulingStore + ?Sized,
    Z: TimeZone,
{
    check_slot(
        store,
        event_type_id,
        scheduled_at,
        requested_duration_minutes,
        options,
    )
    .map(|verdict| verdict.is_available())
}

fn reject(rejection: Rejection) -> Verdict {
    debug!(%rejection, "slot rejected");
    Verdict::Rejected(rejection)
}

/// Time-of-day containment on the UTC clock. The end time-of-day wraps past
/// midnight, so an interval crossing 00:00 UTC compares its wrapped end.
fn contained_raw(rules: &[AvailabilityRule], start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    let slot_start = start.time();
    let slot_end = end.time();
    rules
        .iter()
        .any(|r| r.start_time <= slot_start && slot_end <= r.end_time)
}

/// Rules whose weekday matches the weekday of `start` in the rule's own zone.
fn rules_on_local_day(
    rules: &[AvailabilityRule],
    start: DateTime<Utc>,
) -> Result<Vec<AvailabilityRule>> {
    let mut matching = Vec::new();
    for rule in rules {
        let tz = time::parse_timezone(&rule.timezone)?;
        let local_date = start.with_timezone(&tz).date_naive();
        if weekday_index(local_date) == rule.day_of_week {
            matching.push(rule.clone());
        }
    }
    Ok(matching)
}

/// Weekday of `start` in the zone of the first rule, or in UTC when there are
/// no rules.
fn local_day(rules: &[AvailabilityRule], start: DateTime<Utc>) -> Result<u8> {
    match rules.first() {
        Some(rule) => {
            let tz = time::parse_timezone(&rule.timezone)?;
            Ok(weekday_index(start.with_timezone(&tz).date_naive()))
        }
        None => Ok(weekday_index(start.date_naive())),
    }
}

fn contained_local(
    rules: &[AvailabilityRule],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    options: &EngineOptions,
) -> Result<bool> {
    for rule in rules {
        let tz = time::parse_timezone(&rule.timezone)?;
        let local_date = start.with_timezone(&tz).date_naive();
        if let Some((window_start, window_end)) = rule_window(rule, local_date, options.dst_policy)?
        {
            if window_start <= start && end <= window_end {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Scheduled meetings are sized with the event type's current duration.
fn first_conflict<S>(
    store: &S,
    event_type: &EventType,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Option<Conflict>>
where
    S: SchedulingStore + ?Sized,
{
    let duration = event_type.duration();
    let range = TimeRange::new(start - duration, end);
    let meetings = store.list_scheduled_meetings(event_type.id, Some(range))?;
    let booked = booked_intervals(&meetings, duration);
    Ok(find_conflicts(start, end, &booked).into_iter().next())
}
