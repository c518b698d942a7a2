//! Domain records: event types, weekly availability rules and meetings.
//!
//! These are plain data carriers shared by the persistence port, the resolver
//! and the validator. Field invariants are checked by the `validate` methods
//! here and enforced by [`crate::catalog`] before anything reaches a store.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Result};
use crate::time;

pub type EventTypeId = u64;
pub type RuleId = u64;
pub type MeetingId = u64;

/// Zone used when a rule is created without one.
pub const DEFAULT_TIMEZONE: &str = "UTC";

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

/// A bookable meeting template with a fixed slot duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventType {
    pub id: EventTypeId,
    pub name: String,
    pub duration_minutes: u32,
    /// Unique, URL-safe identifier.
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventType {
    /// Current slot length. Used for every meeting of this type, including
    /// meetings booked while the type had a different duration.
    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.duration_minutes))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEventType {
    pub name: String,
    pub duration_minutes: u32,
    pub slug: String,
}

impl NewEventType {
    pub fn new(name: impl Into<String>, duration_minutes: u32, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            duration_minutes,
            slug: slug.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        validate_duration(self.duration_minutes)?;
        validate_slug(&self.slug)
    }
}

/// Partial update of an event type; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTypeUpdate {
    pub name: Option<String>,
    pub duration_minutes: Option<u32>,
    pub slug: Option<String>,
}

impl EventTypeUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(duration) = self.duration_minutes {
            validate_duration(duration)?;
        }
        if let Some(slug) = &self.slug {
            validate_slug(slug)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(BookingError::InvalidEventType(
            "name must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_duration(duration_minutes: u32) -> Result<()> {
    if duration_minutes == 0 {
        return Err(BookingError::InvalidEventType(
            "duration_minutes must be positive".to_string(),
        ));
    }
    Ok(())
}

/// A slug is non-empty, made of lowercase ASCII letters, digits, `-` and `_`,
/// and not digits alone.
pub fn validate_slug(slug: &str) -> Result<()> {
    let url_safe = slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if slug.is_empty() || !url_safe {
        return Err(BookingError::InvalidEventType(format!(
            "slug '{}' is not URL-safe",
            slug
        )));
    }
    // Digit-only keys name event types by id.
    if slug.chars().all(|c| c.is_ascii_digit()) {
        return Err(BookingError::InvalidEventType(format!(
            "slug '{}' must contain a non-digit character",
            slug
        )));
    }
    Ok(())
}

/// A recurring weekly window during which an event type can be booked.
///
/// `start_time` and `end_time` are wall-clock times interpreted in `timezone`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRule {
    pub id: RuleId,
    pub event_type_id: EventTypeId,
    /// 0 = Monday .. 6 = Sunday.
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl AvailabilityRule {
    /// Merge a partial update into a copy of this rule. The result is not
    /// validated; callers check it with [`validate_rule_fields`].
    pub fn merged(&self, update: &AvailabilityRuleUpdate) -> AvailabilityRule {
        AvailabilityRule {
            id: self.id,
            event_type_id: self.event_type_id,
            day_of_week: update.day_of_week.unwrap_or(self.day_of_week),
            start_time: update.start_time.unwrap_or(self.start_time),
            end_time: update.end_time.unwrap_or(self.end_time),
            timezone: update
                .timezone
                .clone()
                .unwrap_or_else(|| self.timezone.clone()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_rule_fields(self.day_of_week, self.start_time, self.end_time, &self.timezone)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAvailabilityRule {
    pub event_type_id: EventTypeId,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl NewAvailabilityRule {
    /// A rule interpreted in UTC.
    pub fn new(
        event_type_id: EventTypeId,
        day_of_week: u8,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Self {
        Self {
            event_type_id,
            day_of_week,
            start_time,
            end_time,
            timezone: default_timezone(),
        }
    }

    pub fn in_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_rule_fields(self.day_of_week, self.start_time, self.end_time, &self.timezone)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRuleUpdate {
    pub day_of_week: Option<u8>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub timezone: Option<String>,
}

/// Check the rule invariants: `0 <= day_of_week <= 6`, `start_time < end_time`
/// and a known IANA timezone.
pub fn validate_rule_fields(
    day_of_week: u8,
    start_time: NaiveTime,
    end_time: NaiveTime,
    timezone: &str,
) -> Result<()> {
    if day_of_week > 6 {
        return Err(BookingError::InvalidRule(
            "day_of_week must be between 0 and 6".to_string(),
        ));
    }
    if start_time >= end_time {
        return Err(BookingError::InvalidRule(
            "start_time must be before end_time".to_string(),
        ));
    }
    time::parse_timezone(timezone)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    Scheduled,
    Cancelled,
    Completed,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Scheduled => "scheduled",
            MeetingStatus::Cancelled => "cancelled",
            MeetingStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeetingStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scheduled" => Ok(MeetingStatus::Scheduled),
            "cancelled" => Ok(MeetingStatus::Cancelled),
            "completed" => Ok(MeetingStatus::Completed),
            other => Err(format!(
                "Invalid status: {}. Must be one of: scheduled, cancelled, completed",
                other
            )),
        }
    }
}

/// A booked meeting. `scheduled_at` is always stored in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: MeetingId,
    pub event_type_id: EventTypeId,
    pub invitee_name: String,
    pub invitee_email: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: MeetingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    /// Status as seen at `now`: a Scheduled meeting whose start has passed
    /// reads as Completed. Nothing is written back.
    pub fn effective_status(&self, now: DateTime<Utc>) -> MeetingStatus {
        match self.status {
            MeetingStatus::Scheduled if self.scheduled_at < now => MeetingStatus::Completed,
            status => status,
        }
    }

    /// Only stored-Scheduled meetings occupy the calendar.
    pub fn occupies_calendar(&self) -> bool {
        self.status == MeetingStatus::Scheduled
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMeeting {
    pub event_type_id: EventTypeId,
    pub invitee_name: String,
    pub invitee_email: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: MeetingStatus,
}

impl NewMeeting {
    pub fn scheduled(
        event_type_id: EventTypeId,
        invitee_name: impl Into<String>,
        invitee_email: impl Into<String>,
        scheduled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_type_id,
            invitee_name: invitee_name.into(),
            invitee_email: invitee_email.into(),
            scheduled_at,
            status: MeetingStatus::Scheduled,
        }
    }
}

/// Inclusive range of instants used to narrow meeting queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}
