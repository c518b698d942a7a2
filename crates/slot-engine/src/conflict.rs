//! Detect overlaps between a proposed booking and existing meetings.
//!
//! Every existing meeting occupies `[scheduled_at, scheduled_at + duration)`,
//! where `duration` is the event type's current duration. Adjacent intervals
//! (one ends exactly when the other starts) are NOT conflicts.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Meeting, MeetingId};
use crate::time::overlaps;

/// The interval a Scheduled meeting occupies on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedInterval {
    pub meeting_id: MeetingId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Size each meeting with `duration`, skipping meetings that do not occupy
/// the calendar.
pub fn booked_intervals(meetings: &[Meeting], duration: Duration) -> Vec<BookedInterval> {
    meetings
        .iter()
        .filter(|m| m.occupies_calendar())
        .map(|m| BookedInterval {
            meeting_id: m.id,
            start: m.scheduled_at,
            end: m.scheduled_at + duration,
        })
        .collect()
}

/// A detected conflict between a proposed interval and a booked meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub meeting_id: MeetingId,
    pub meeting_start: DateTime<Utc>,
    pub meeting_end: DateTime<Utc>,
    pub overlap_minutes: i64,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "overlaps meeting {} ({} to {}) by {} minutes",
            self.meeting_id,
            self.meeting_start.to_rfc3339(),
            self.meeting_end.to_rfc3339(),
            self.overlap_minutes
        )
    }
}

/// Find every booked interval that overlaps `[start, end)`.
///
/// Overlap holds when `booked.start < end && start < booked.end`; the overlap
/// length is `min(ends) - max(starts)`.
pub fn find_conflicts(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    booked: &[BookedInterval],
) -> Vec<Conflict> {
    booked
        .iter()
        .filter(|b| overlaps(start, end, b.start, b.end))
        .map(|b| Conflict {
            meeting_id: b.meeting_id,
            meeting_start: b.start,
            meeting_end: b.end,
            overlap_minutes: (end.min(b.end) - start.max(b.start)).num_minutes(),
        })
        .collect()
}
