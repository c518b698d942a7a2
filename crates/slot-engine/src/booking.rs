//! Booking service: slot listing, atomic booking, cancellation and meeting
//! queries on top of a [`SchedulingStore`].
//!
//! `book` holds a per-event-type lock while it validates and inserts, so two
//! concurrent requests for overlapping intervals cannot both pass validation.
//! The store's unique `(event_type_id, scheduled_at)` constraint backs this up
//! for writers that bypass the service.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog;
use crate::error::{BookingError, Entity, Result};
use crate::model::{EventTypeId, Meeting, MeetingId, MeetingStatus, NewMeeting};
use crate::options::EngineOptions;
use crate::resolver::{self, AvailableSlots};
use crate::store::SchedulingStore;
use crate::validator::{self, Verdict};

/// A booking request from an invitee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBooking {
    pub event_type_id: EventTypeId,
    pub invitee_name: String,
    pub invitee_email: String,
    pub scheduled_at: DateTime<Utc>,
}

/// Filters for [`BookingService::list_meetings`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeetingFilter {
    /// Matched against the effective status at `now`.
    pub status: Option<MeetingStatus>,
    pub upcoming_only: bool,
    pub past_only: bool,
}

pub struct BookingService<S: SchedulingStore + ?Sized> {
    store: Arc<S>,
    options: EngineOptions,
    gates: Mutex<HashMap<EventTypeId, Arc<Mutex<()>>>>,
}

impl<S: SchedulingStore + ?Sized> BookingService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self::with_options(store, EngineOptions::default())
    }

    pub fn with_options(store: Arc<S>, options: EngineOptions) -> Self {
        Self {
            store,
            options,
            gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Bookable start instants of an event type on `date`.
    pub fn resolve_slots(
        &self,
        event_type_id: EventTypeId,
        date: NaiveDate,
        timezone: &str,
    ) -> Result<Vec<DateTime<Utc>>> {
        resolver::resolve_slots(&*self.store, event_type_id, date, timezone, &self.options)
    }

    /// Slots for the event type with `slug`, rendered in `timezone`.
    ///
    /// # Errors
    /// `NotFound` when no event type has this slug.
    pub fn available_slots(
        &self,
        slug: &str,
        date: NaiveDate,
        timezone: &str,
    ) -> Result<AvailableSlots> {
        let event_type = catalog::get_event_type_by_slug(&*self.store, slug)?;
        AvailableSlots::build(&*self.store, &event_type, date, timezone, &self.options)
    }

    pub fn check(
        &self,
        event_type_id: EventTypeId,
        scheduled_at: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Result<Verdict> {
        validator::check_slot(
            &*self.store,
            event_type_id,
            scheduled_at,
            duration_minutes,
            &self.options,
        )
    }

    pub fn is_available(
        &self,
        event_type_id: EventTypeId,
        scheduled_at: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Result<bool> {
        self.check(event_type_id, scheduled_at, duration_minutes)
            .map(|verdict| verdict.is_available())
    }

    /// Validate and insert a booking as one step.
    ///
    /// # Errors
    /// `NotFound` for an unknown event type, `Unavailable` when the slot fails
    /// containment or conflict checks, `SlotTaken` if the store still sees a
    /// clash at insert time.
    pub fn book(&self, booking: NewBooking) -> Result<Meeting> {
        let event_type = catalog::get_event_type(&*self.store, booking.event_type_id)?;

        let gate = self.gate(event_type.id)?;
        let _guard = gate
            .lock()
            .map_err(|_| BookingError::Storage("booking lock poisoned".to_string()))?;

        let verdict = validator::check_slot(
            &*self.store,
            event_type.id,
            booking.scheduled_at,
            event_type.duration_minutes,
            &self.options,
        )?;
        if let Verdict::Rejected(rejection) = verdict {
            return Err(BookingError::Unavailable(rejection));
        }

        let meeting = self
            .store
            .insert_meeting(NewMeeting::scheduled(
                event_type.id,
                booking.invitee_name,
                booking.invitee_email,
                booking.scheduled_at,
            ))
            .inspect_err(|e| {
                if matches!(e, BookingError::SlotTaken { .. }) {
                    warn!(event_type_id = event_type.id, "store rejected duplicate booking");
                }
            })?;
        info!(
            meeting_id = meeting.id,
            event_type_id = meeting.event_type_id,
            scheduled_at = %meeting.scheduled_at,
            "booked meeting"
        );
        Ok(meeting)
    }

    /// Cancel a Scheduled meeting, freeing its slot.
    ///
    /// # Errors
    /// `NotFound` for an unknown meeting, `InvalidTransition` when the meeting
    /// is not Scheduled.
    pub fn cancel(&self, meeting_id: MeetingId) -> Result<Meeting> {
        let meeting = self.get_meeting(meeting_id)?;
        if meeting.status != MeetingStatus::Scheduled {
            return Err(BookingError::InvalidTransition {
                meeting_id,
                status: meeting.status,
            });
        }
        let meeting = self
            .store
            .update_meeting_status(meeting_id, MeetingStatus::Cancelled)?;
        info!(meeting_id, "cancelled meeting");
        Ok(meeting)
    }

    /// Delete an event type with its rules and meetings, and drop its
    /// booking lock. The lock table therefore holds at most one entry per
    /// live event type.
    pub fn delete_event_type(&self, event_type_id: EventTypeId) -> Result<()> {
        catalog::delete_event_type(&*self.store, event_type_id)?;
        self.gates
            .lock()
            .map_err(|_| BookingError::Storage("booking lock table poisoned".to_string()))?
            .remove(&event_type_id);
        Ok(())
    }

    /// Number of event types with a booking lock.
    pub fn gate_count(&self) -> usize {
        self.gates.lock().map_or(0, |gates| gates.len())
    }

    pub fn get_meeting(&self, meeting_id: MeetingId) -> Result<Meeting> {
        self.store
            .find_meeting(meeting_id)?
            .ok_or_else(|| BookingError::not_found(Entity::Meeting, meeting_id))
    }

    /// Meetings with their effective status at `now`, newest first.
    ///
    /// `upcoming_only` keeps Scheduled meetings that have not started and
    /// lists them soonest first.
    pub fn list_meetings(&self, filter: MeetingFilter, now: DateTime<Utc>) -> Result<Vec<Meeting>> {
        let mut meetings: Vec<Meeting> = self
            .store
            .list_meetings()?
            .into_iter()
            .filter(|m| {
                !filter.upcoming_only
                    || (m.scheduled_at >= now && m.status == MeetingStatus::Scheduled)
            })
            .filter(|m| !filter.past_only || m.scheduled_at < now)
            .map(|m| with_effective_status(m, now))
            .filter(|m| filter.status.is_none_or(|status| m.status == status))
            .collect();
        if filter.upcoming_only {
            meetings.sort_by_key(|m| (m.scheduled_at, m.id));
        } else {
            meetings.sort_by(|a, b| b.scheduled_at.cmp(&a.scheduled_at));
        }
        Ok(meetings)
    }

    /// Scheduled meetings that have not started yet, soonest first.
    pub fn upcoming_meetings(&self, now: DateTime<Utc>) -> Result<Vec<Meeting>> {
        self.list_meetings(
            MeetingFilter {
                upcoming_only: true,
                ..MeetingFilter::default()
            },
            now,
        )
    }

    /// Meetings whose start has passed, newest first.
    pub fn past_meetings(&self, now: DateTime<Utc>) -> Result<Vec<Meeting>> {
        self.list_meetings(
            MeetingFilter {
                past_only: true,
                ..MeetingFilter::default()
            },
            now,
        )
    }

    fn gate(&self, event_type_id: EventTypeId) -> Result<Arc<Mutex<()>>> {
        let mut gates = self
            .gates
            .lock()
            .map_err(|_| BookingError::Storage("booking lock table poisoned".to_string()))?;
        Ok(gates.entry(event_type_id).or_default().clone())
    }
}

fn with_effective_status(mut meeting: Meeting, now: DateTime<Utc>) -> Meeting {
    meeting.status = meeting.effective_status(now);
    meeting
}
