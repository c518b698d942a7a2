//! In-memory [`SchedulingStore`] with JSON snapshots.
//!
//! All tables live behind one `RwLock`, so every port method is atomic with
//! respect to every other. A [`Snapshot`] is the serializable form of the
//! tables and is what the CLI reads from and writes to disk.
//!
//! Ids are never reused: each table keeps a counter that only moves forward,
//! even when the record holding the largest id is deleted.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, Entity, Result};
use crate::model::{
    AvailabilityRule, EventType, EventTypeId, EventTypeUpdate, Meeting, MeetingId, MeetingStatus,
    NewAvailabilityRule, NewEventType, NewMeeting, RuleId, TimeRange,
};
use crate::store::SchedulingStore;

/// Serializable contents of a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub event_types: Vec<EventType>,
    #[serde(default)]
    pub availability_rules: Vec<AvailabilityRule>,
    #[serde(default)]
    pub meetings: Vec<Meeting>,
    /// Next id each table hands out. Missing or stale values are raised past
    /// the largest id present on load.
    #[serde(default)]
    pub next_ids: NextIds,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NextIds {
    #[serde(default)]
    pub event_type: EventTypeId,
    #[serde(default)]
    pub rule: RuleId,
    #[serde(default)]
    pub meeting: MeetingId,
}

#[derive(Debug, Default)]
struct Tables {
    event_types: BTreeMap<EventTypeId, EventType>,
    rules: BTreeMap<RuleId, AvailabilityRule>,
    meetings: BTreeMap<MeetingId, Meeting>,
    next_ids: NextIds,
}

/// The id `counter` would hand out next: at least 1 and past every key in use.
fn peek<V>(counter: u64, table: &BTreeMap<u64, V>) -> u64 {
    let floor = table.keys().next_back().map_or(1, |id| id + 1);
    counter.max(floor)
}

fn allocate<V>(counter: &mut u64, table: &BTreeMap<u64, V>) -> u64 {
    let id = peek(*counter, table);
    *counter = id + 1;
    id
}

impl Tables {
    fn next_event_type_id(&mut self) -> EventTypeId {
        allocate(&mut self.next_ids.event_type, &self.event_types)
    }

    fn next_rule_id(&mut self) -> RuleId {
        allocate(&mut self.next_ids.rule, &self.rules)
    }

    fn next_meeting_id(&mut self) -> MeetingId {
        allocate(&mut self.next_ids.meeting, &self.meetings)
    }

    fn slug_owner(&self, slug: &str) -> Option<EventTypeId> {
        self.event_types
            .values()
            .find(|et| et.slug == slug)
            .map(|et| et.id)
    }

    fn require_event_type(&self, id: EventTypeId) -> Result<()> {
        if self.event_types.contains_key(&id) {
            Ok(())
        } else {
            Err(BookingError::not_found(Entity::EventType, id))
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from a snapshot. Ids continue from the saved counters,
    /// or after the largest id present when the counters are missing.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let tables = Tables {
            event_types: snapshot
                .event_types
                .into_iter()
                .map(|et| (et.id, et))
                .collect(),
            rules: snapshot
                .availability_rules
                .into_iter()
                .map(|r| (r.id, r))
                .collect(),
            meetings: snapshot.meetings.into_iter().map(|m| (m.id, m)).collect(),
            next_ids: snapshot.next_ids,
        };
        Self {
            tables: RwLock::new(tables),
        }
    }

    pub fn snapshot(&self) -> Result<Snapshot> {
        let tables = self.read()?;
        Ok(Snapshot {
            event_types: tables.event_types.values().cloned().collect(),
            availability_rules: tables.rules.values().cloned().collect(),
            meetings: tables.meetings.values().cloned().collect(),
            next_ids: NextIds {
                event_type: peek(tables.next_ids.event_type, &tables.event_types),
                rule: peek(tables.next_ids.rule, &tables.rules),
                meeting: peek(tables.next_ids.meeting, &tables.meetings),
            },
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)
            .map_err(|e| BookingError::Storage(format!("invalid snapshot: {}", e)))?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn to_json(&self) -> Result<String> {
        let snapshot = self.snapshot()?;
        serde_json::to_string_pretty(&snapshot)
            .map_err(|e| BookingError::Storage(format!("cannot serialize snapshot: {}", e)))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| BookingError::Storage("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| BookingError::Storage("store lock poisoned".to_string()))
    }
}

impl SchedulingStore for MemoryStore {
    fn find_event_type(&self, id: EventTypeId) -> Result<Option<EventType>> {
        Ok(self.read()?.event_types.get(&id).cloned())
    }

    fn find_event_type_by_slug(&self, slug: &str) -> Result<Option<EventType>> {
        let tables = self.read()?;
        Ok(tables
            .event_types
            .values()
            .find(|et| et.slug == slug)
            .cloned())
    }

    fn list_event_types(&self) -> Result<Vec<EventType>> {
        Ok(self.read()?.event_types.values().cloned().collect())
    }

    fn insert_event_type(&self, new: NewEventType) -> Result<EventType> {
        let mut tables = self.write()?;
        if tables.slug_owner(&new.slug).is_some() {
            return Err(BookingError::DuplicateSlug(new.slug));
        }
        let now = Utc::now();
        let event_type = EventType {
            id: tables.next_event_type_id(),
            name: new.name,
            duration_minutes: new.duration_minutes,
            slug: new.slug,
            created_at: now,
            updated_at: now,
        };
        tables.event_types.insert(event_type.id, event_type.clone());
        Ok(event_type)
    }

    fn update_event_type(&self, id: EventTypeId, update: EventTypeUpdate) -> Result<EventType> {
        let mut tables = self.write()?;
        if let Some(slug) = &update.slug {
            if matches!(tables.slug_owner(slug), Some(owner) if owner != id) {
                return Err(BookingError::DuplicateSlug(slug.clone()));
            }
        }
        let event_type = tables
            .event_types
            .get_mut(&id)
            .ok_or_else(|| BookingError::not_found(Entity::EventType, id))?;
        if let Some(name) = update.name {
            event_type.name = name;
        }
        if let Some(duration) = update.duration_minutes {
            event_type.duration_minutes = duration;
        }
        if let Some(slug) = update.slug {
            event_type.slug = slug;
        }
        event_type.updated_at = Utc::now();
        Ok(event_type.clone())
    }

    fn delete_event_type(&self, id: EventTypeId) -> Result<()> {
        let mut tables = self.write()?;
        if tables.event_types.remove(&id).is_none() {
            return Err(BookingError::not_found(Entity::EventType, id));
        }
        tables.rules.retain(|_, r| r.event_type_id != id);
        tables.meetings.retain(|_, m| m.event_type_id != id);
        Ok(())
    }

    fn list_availability_rules(
        &self,
        event_type_id: EventTypeId,
        day_of_week: Option<u8>,
    ) -> Result<Vec<AvailabilityRule>> {
        let tables = self.read()?;
        Ok(tables
            .rules
            .values()
            .filter(|r| r.event_type_id == event_type_id)
            .filter(|r| day_of_week.is_none_or(|day| r.day_of_week == day))
            .cloned()
            .collect())
    }

    fn find_availability_rule(&self, id: RuleId) -> Result<Option<AvailabilityRule>> {
        Ok(self.read()?.rules.get(&id).cloned())
    }

    fn insert_availability_rules(
        &self,
        rules: Vec<NewAvailabilityRule>,
    ) -> Result<Vec<AvailabilityRule>> {
        let mut tables = self.write()?;
        for rule in &rules {
            tables.require_event_type(rule.event_type_id)?;
        }
        let mut created = Vec::with_capacity(rules.len());
        for rule in rules {
            let rule = AvailabilityRule {
                id: tables.next_rule_id(),
                event_type_id: rule.event_type_id,
                day_of_week: rule.day_of_week,
                start_time: rule.start_time,
                end_time: rule.end_time,
                timezone: rule.timezone,
            };
            tables.rules.insert(rule.id, rule.clone());
            created.push(rule);
        }
        Ok(created)
    }

    fn replace_availability_rule(&self, rule: AvailabilityRule) -> Result<AvailabilityRule> {
        let mut tables = self.write()?;
        tables.require_event_type(rule.event_type_id)?;
        let slot = tables
            .rules
            .get_mut(&rule.id)
            .ok_or_else(|| BookingError::not_found(Entity::AvailabilityRule, rule.id))?;
        *slot = rule.clone();
        Ok(rule)
    }

    fn delete_availability_rule(&self, id: RuleId) -> Result<()> {
        self.write()?
            .rules
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| BookingError::not_found(Entity::AvailabilityRule, id))
    }

    fn delete_availability_rules(&self, event_type_id: EventTypeId) -> Result<usize> {
        let mut tables = self.write()?;
        let before = tables.rules.len();
        tables.rules.retain(|_, r| r.event_type_id != event_type_id);
        Ok(before - tables.rules.len())
    }

    fn list_scheduled_meetings(
        &self,
        event_type_id: EventTypeId,
        range: Option<TimeRange>,
    ) -> Result<Vec<Meeting>> {
        let tables = self.read()?;
        let mut meetings: Vec<Meeting> = tables
            .meetings
            .values()
            .filter(|m| m.event_type_id == event_type_id && m.occupies_calendar())
            .filter(|m| range.is_none_or(|r| r.contains(m.scheduled_at)))
            .cloned()
            .collect();
        meetings.sort_by_key(|m| (m.scheduled_at, m.id));
        Ok(meetings)
    }

    fn list_meetings(&self) -> Result<Vec<Meeting>> {
        Ok(self.read()?.meetings.values().cloned().collect())
    }

    fn find_meeting(&self, id: MeetingId) -> Result<Option<Meeting>> {
        Ok(self.read()?.meetings.get(&id).cloned())
    }

    fn insert_meeting(&self, new: NewMeeting) -> Result<Meeting> {
        let mut tables = self.write()?;
        tables.require_event_type(new.event_type_id)?;
        if new.status == MeetingStatus::Scheduled {
            let taken = tables.meetings.values().any(|m| {
                m.event_type_id == new.event_type_id
                    && m.occupies_calendar()
                    && m.scheduled_at == new.scheduled_at
            });
            if taken {
                return Err(BookingError::SlotTaken {
                    event_type_id: new.event_type_id,
                    scheduled_at: new.scheduled_at,
                });
            }
        }
        let now = Utc::now();
        let meeting = Meeting {
            id: tables.next_meeting_id(),
            event_type_id: new.event_type_id,
            invitee_name: new.invitee_name,
            invitee_email: new.invitee_email,
            scheduled_at: new.scheduled_at,
            status: new.status,
            created_at: now,
            updated_at: now,
        };
        tables.meetings.insert(meeting.id, meeting.clone());
        Ok(meeting)
    }

    fn update_meeting_status(&self, id: MeetingId, status: MeetingStatus) -> Result<Meeting> {
        let mut tables = self.write()?;
        let current = tables
            .meetings
            .get(&id)
            .cloned()
            .ok_or_else(|| BookingError::not_found(Entity::Meeting, id))?;
        if status == MeetingStatus::Scheduled && !current.occupies_calendar() {
            let taken = tables.meetings.values().any(|m| {
                m.id != id
                    && m.event_type_id == current.event_type_id
                    && m.occupies_calendar()
                    && m.scheduled_at == current.scheduled_at
            });
            if taken {
                return Err(BookingError::SlotTaken {
                    event_type_id: current.event_type_id,
                    scheduled_at: current.scheduled_at,
                });
            }
        }
        let meeting = tables
            .meetings
            .get_mut(&id)
            .ok_or_else(|| BookingError::not_found(Entity::Meeting, id))?;
        meeting.status = status;
        meeting.updated_at = Utc::now();
        Ok(meeting.clone())
    }
}
