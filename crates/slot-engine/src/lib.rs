//! # slot-engine
//!
//! Timezone-aware slot computation and conflict validation for bookable
//! event types.
//!
//! An organizer defines event types with a fixed duration and attaches weekly
//! availability rules to them. The engine answers two questions over that
//! data: which start instants are free on a given date, and whether one
//! specific proposed booking may be accepted. Both read through the
//! [`SchedulingStore`] port, so they can run against any backend.
//!
//! ## Modules
//!
//! - [`resolver`] — rules + bookings → ordered free slots for a date
//! - [`validator`] — containment and conflict checks for one proposal
//! - [`booking`] — atomic validate-and-insert, cancellation, meeting queries
//! - [`catalog`] — event type and rule CRUD with invariant checks
//! - [`store`] — the persistence port; [`memory`] — in-memory implementation
//! - [`conflict`], [`freebusy`] — interval overlap and busy-period merging
//! - [`dst`] — DST gap policy; [`time`] — shared time arithmetic
//! - [`options`] — behaviour switches; [`seed`] — demo data
//! - [`model`], [`error`] — records and error types

pub mod booking;
pub mod catalog;
pub mod conflict;
pub mod dst;
pub mod error;
pub mod freebusy;
pub mod memory;
pub mod model;
pub mod options;
pub mod resolver;
pub mod seed;
pub mod store;
pub mod time;
pub mod validator;

pub use booking::{BookingService, MeetingFilter, NewBooking};
pub use dst::DstPolicy;
pub use error::{BookingError, Entity};
pub use memory::{MemoryStore, NextIds, Snapshot};
pub use model::{
    AvailabilityRule, AvailabilityRuleUpdate, EventType, EventTypeUpdate, Meeting, MeetingStatus,
    NewAvailabilityRule, NewEventType, NewMeeting,
};
pub use options::{Containment, EngineOptions, SlotExclusion};
pub use resolver::{resolve_slots, AvailableSlots};
pub use store::SchedulingStore;
pub use validator::{check_slot, is_available, Rejection, Verdict};
