//! Availability Resolver: enumerate the bookable start instants of one day.
//!
//! Each availability rule is localized into its own timezone on the requested
//! date and converted to UTC, then stepped in units of the event type's
//! duration. Candidates that collide with Scheduled meetings are dropped
//! (see [`SlotExclusion`]) and the survivors of all rules are merged, sorted
//! and deduplicated.

use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conflict::booked_intervals;
use crate::dst::{self, DstPolicy};
use crate::error::Result;
use crate::freebusy::BusyPeriods;
use crate::model::{AvailabilityRule, EventType, EventTypeId, TimeRange};
use crate::options::{EngineOptions, SlotExclusion};
use crate::store::SchedulingStore;
use crate::time::{self, utc_day_bounds, weekday_index};

/// The UTC window a rule covers on `date`, or `None` when a boundary falls in
/// a DST gap under [`DstPolicy::Skip`].
///
/// # Errors
/// Returns `BookingError::InvalidTimezone` if the rule's zone is unknown.
pub fn rule_window(
    rule: &AvailabilityRule,
    date: NaiveDate,
    policy: DstPolicy,
) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
    let tz = time::parse_timezone(&rule.timezone)?;
    let start = dst::localize(tz, date.and_time(rule.start_time), policy);
    let end = dst::localize(tz, date.and_time(rule.end_time), policy);
    Ok(start.zip(end))
}

/// Compute the ordered, deduplicated bookable start instants of `date`.
///
/// An unknown event type and a weekday without rules both produce an empty
/// list. `timezone` is the caller's presentation zone; it must be a valid
/// IANA name but does not move the rule windows, which are always read in
/// each rule's own zone.
///
/// # Errors
/// Returns `BookingError::InvalidTimezone` for an unknown `timezone` or rule
/// zone, and propagates store failures.
pub fn resolve_slots<S>(
    store: &S,
    event_type_id: EventTypeId,
    date: NaiveDate,
    timezone: &str,
    options: &EngineOptions,
) -> Result<Vec<DateTime<Utc>>>
where
    S: SchedulingStore + ?Sized,
{
    time::parse_timezone(timezone)?;

    let Some(event_type) = store.find_event_type(event_type_id)? else {
        debug!(event_type_id, "no such event type, no slots");
        return Ok(Vec::new());
    };

    let slots = resolve_for_event_type(store, &event_type, date, options)?;
    debug!(
        event_type_id,
        %date,
        count = slots.len(),
        "resolved available slots"
    );
    Ok(slots)
}

fn resolve_for_event_type<S>(
    store: &S,
    event_type: &EventType,
    date: NaiveDate,
    options: &EngineOptions,
) -> Result<Vec<DateTime<Utc>>>
where
    S: SchedulingStore + ?Sized,
{
    if event_type.duration_minutes == 0 {
        return Ok(Vec::new());
    }

    let day_of_week = weekday_index(date);
    let rules = store.list_availability_rules(event_type.id, Some(day_of_week))?;
    if rules.is_empty() {
        return Ok(Vec::new());
    }

    let mut windows = Vec::with_capacity(rules.len());
    for rule in &rules {
        match rule_window(rule, date, options.dst_policy)? {
            Some(window) => windows.push(window),
            None => debug!(rule_id = rule.id, %date, "rule boundary in DST gap, skipped"),
        }
    }
    if windows.is_empty() {
        return Ok(Vec::new());
    }

    let duration = event_type.duration();
    let filter = match options.exclusion {
        SlotExclusion::ExactStart => {
            let meetings =
                store.list_scheduled_meetings(event_type.id, Some(utc_day_bounds(date)))?;
            Exclusion::Starts(meetings.iter().map(|m| m.scheduled_at).collect())
        }
        SlotExclusion::Overlap => {
            // Cover every window, reaching back far enough to see meetings
            // that start before a window and run into it.
            let earliest = windows.iter().map(|w| w.0).min().unwrap_or_default();
            let latest = windows.iter().map(|w| w.1).max().unwrap_or_default();
            let range = TimeRange::new(earliest - duration, latest);
            let meetings = store.list_scheduled_meetings(event_type.id, Some(range))?;
            Exclusion::Busy(BusyPeriods::merge(&booked_intervals(&meetings, duration)))
        }
    };

    let mut slots = BTreeSet::new();
    for (window_start, window_end) in windows {
        let mut current = window_start;
        while current + duration <= window_end {
            if filter.allows(current, current + duration) {
                slots.insert(current);
            }
            current += duration;
        }
    }

    Ok(slots.into_iter().collect())
}

enum Exclusion {
    Starts(HashSet<DateTime<Utc>>),
    Busy(BusyPeriods),
}

impl Exclusion {
    fn allows(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        match self {
            Exclusion::Starts(booked) => !booked.contains(&start),
            Exclusion::Busy(busy) => busy.is_free(start, end),
        }
    }
}

/// One bookable slot, as a UTC instant and in the caller's timezone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub start: DateTime<Utc>,
    /// RFC 3339 rendering of `start` in the requested timezone.
    pub local_start: String,
}

/// Slots of one event type on one date, shaped for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSlots {
    pub event_type_id: EventTypeId,
    pub event_type_name: String,
    pub duration_minutes: u32,
    pub date: NaiveDate,
    pub timezone: String,
    pub available_slots: Vec<Slot>,
}

impl AvailableSlots {
    /// Resolve and render the slots of `event_type` on `date`.
    pub fn build<S>(
        store: &S,
        event_type: &EventType,
        date: NaiveDate,
        timezone: &str,
        options: &EngineOptions,
    ) -> Result<Self>
    where
        S: SchedulingStore + ?Sized,
    {
        let tz = time::parse_timezone(timezone)?;
        let slots = resolve_slots(store, event_type.id, date, timezone, options)?;
        Ok(Self {
            event_type_id: event_type.id,
            event_type_name: event_type.name.clone(),
            duration_minutes: event_type.duration_minutes,
            date,
            timezone: timezone.to_string(),
            available_slots: slots
                .into_iter()
                .map(|start| Slot {
                    start,
                    local_start: start.with_timezone(&tz).to_rfc3339(),
                })
                .collect(),
        })
    }
}
