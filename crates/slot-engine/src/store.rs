//! Persistence port.
//!
//! The resolver, validator and booking service only ever see a
//! [`SchedulingStore`]; the concrete backend is chosen by the caller.
//! [`crate::memory::MemoryStore`] is the in-process implementation.
//!
//! Stores own referential integrity: deleting an event type removes its rules
//! and meetings, slugs are unique, and at most one Scheduled meeting may exist
//! per `(event_type_id, scheduled_at)`.

use crate::error::Result;
use crate::model::{
    AvailabilityRule, EventType, EventTypeId, EventTypeUpdate, Meeting, MeetingId, MeetingStatus,
    NewAvailabilityRule, NewEventType, NewMeeting, RuleId, TimeRange,
};

pub trait SchedulingStore: Send + Sync {
    fn find_event_type(&self, id: EventTypeId) -> Result<Option<EventType>>;

    fn find_event_type_by_slug(&self, slug: &str) -> Result<Option<EventType>>;

    /// All event types, ordered by id.
    fn list_event_types(&self) -> Result<Vec<EventType>>;

    /// Fails with `DuplicateSlug` when the slug is taken.
    fn insert_event_type(&self, new: NewEventType) -> Result<EventType>;

    /// Fails with `NotFound` or `DuplicateSlug`.
    fn update_event_type(&self, id: EventTypeId, update: EventTypeUpdate) -> Result<EventType>;

    /// Removes the event type together with its rules and meetings.
    fn delete_event_type(&self, id: EventTypeId) -> Result<()>;

    /// Rules of one event type, optionally narrowed to a weekday, ordered by id.
    fn list_availability_rules(
        &self,
        event_type_id: EventTypeId,
        day_of_week: Option<u8>,
    ) -> Result<Vec<AvailabilityRule>>;

    fn find_availability_rule(&self, id: RuleId) -> Result<Option<AvailabilityRule>>;

    /// Inserts every rule or none of them.
    fn insert_availability_rules(
        &self,
        rules: Vec<NewAvailabilityRule>,
    ) -> Result<Vec<AvailabilityRule>>;

    /// Overwrites the stored rule with the same id.
    fn replace_availability_rule(&self, rule: AvailabilityRule) -> Result<AvailabilityRule>;

    fn delete_availability_rule(&self, id: RuleId) -> Result<()>;

    /// Removes all rules of an event type and returns how many were removed.
    fn delete_availability_rules(&self, event_type_id: EventTypeId) -> Result<usize>;

    /// Scheduled meetings of one event type, optionally narrowed to those whose
    /// `scheduled_at` lies in `range`, ordered by `scheduled_at`.
    fn list_scheduled_meetings(
        &self,
        event_type_id: EventTypeId,
        range: Option<TimeRange>,
    ) -> Result<Vec<Meeting>>;

    /// Every meeting regardless of status, ordered by id.
    fn list_meetings(&self) -> Result<Vec<Meeting>>;

    fn find_meeting(&self, id: MeetingId) -> Result<Option<Meeting>>;

    /// Fails with `NotFound` for an unknown event type and with `SlotTaken` when
    /// a Scheduled meeting already starts at the same instant.
    fn insert_meeting(&self, new: NewMeeting) -> Result<Meeting>;

    fn update_meeting_status(&self, id: MeetingId, status: MeetingStatus) -> Result<Meeting>;
}
