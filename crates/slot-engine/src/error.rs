//! Error types for slot-engine operations.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{EventTypeId, MeetingId, MeetingStatus};
use crate::validator::Rejection;

/// The kind of record a [`BookingError::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    EventType,
    AvailabilityRule,
    Meeting,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::EventType => "Event type",
            Entity::AvailabilityRule => "Availability rule",
            Entity::Meeting => "Meeting",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookingError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: Entity, key: String },

    #[error("Invalid availability rule: {0}")]
    InvalidRule(String),

    #[error("Invalid event type: {0}")]
    InvalidEventType(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// The proposed booking failed the containment or conflict check.
    #[error("Time slot is not available: {0}")]
    Unavailable(Rejection),

    #[error("Slug already exists: {0}")]
    DuplicateSlug(String),

    /// The store refused a second Scheduled meeting at the same instant.
    #[error("Event type {event_type_id} is already booked at {scheduled_at}")]
    SlotTaken {
        event_type_id: EventTypeId,
        scheduled_at: DateTime<Utc>,
    },

    #[error("Meeting {meeting_id} is {status} and cannot be cancelled")]
    InvalidTransition {
        meeting_id: MeetingId,
        status: MeetingStatus,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl BookingError {
    pub fn not_found(entity: Entity, key: impl ToString) -> Self {
        BookingError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BookingError>;
