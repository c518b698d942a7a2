//! Event type and availability rule management.
//!
//! Every write is validated before it reaches the store, so an invalid request
//! never leaves a partial change behind.

use tracing::info;

use crate::error::{BookingError, Entity, Result};
use crate::model::{
    AvailabilityRule, AvailabilityRuleUpdate, EventType, EventTypeId, EventTypeUpdate,
    NewAvailabilityRule, NewEventType, RuleId,
};
use crate::store::SchedulingStore;

pub fn get_event_type<S>(store: &S, id: EventTypeId) -> Result<EventType>
where
    S: SchedulingStore + ?Sized,
{
    store
        .find_event_type(id)?
        .ok_or_else(|| BookingError::not_found(Entity::EventType, id))
}

pub fn get_event_type_by_slug<S>(store: &S, slug: &str) -> Result<EventType>
where
    S: SchedulingStore + ?Sized,
{
    store
        .find_event_type_by_slug(slug)?
        .ok_or_else(|| BookingError::not_found(Entity::EventType, slug))
}

pub fn create_event_type<S>(store: &S, new: NewEventType) -> Result<EventType>
where
    S: SchedulingStore + ?Sized,
{
    new.validate()?;
    if store.find_event_type_by_slug(&new.slug)?.is_some() {
        return Err(BookingError::DuplicateSlug(new.slug));
    }
    let event_type = store.insert_event_type(new)?;
    info!(id = event_type.id, slug = %event_type.slug, "created event type");
    Ok(event_type)
}

/// Apply a partial update. Changing the duration does not resize meetings that
/// already exist; they are measured with the new duration from then on.
pub fn update_event_type<S>(
    store: &S,
    id: EventTypeId,
    update: EventTypeUpdate,
) -> Result<EventType>
where
    S: SchedulingStore + ?Sized,
{
    update.validate()?;
    let current = get_event_type(store, id)?;
    if let Some(slug) = update.slug.as_deref().filter(|s| *s != current.slug) {
        if store.find_event_type_by_slug(slug)?.is_some() {
            return Err(BookingError::DuplicateSlug(slug.to_string()));
        }
    }
    store.update_event_type(id, update)
}

/// Delete an event type with its rules and meetings.
pub fn delete_event_type<S>(store: &S, id: EventTypeId) -> Result<()>
where
    S: SchedulingStore + ?Sized,
{
    get_event_type(store, id)?;
    store.delete_event_type(id)?;
    info!(id, "deleted event type");
    Ok(())
}

pub fn list_rules<S>(store: &S, event_type_id: EventTypeId) -> Result<Vec<AvailabilityRule>>
where
    S: SchedulingStore + ?Sized,
{
    get_event_type(store, event_type_id)?;
    store.list_availability_rules(event_type_id, None)
}

pub fn create_rule<S>(store: &S, rule: NewAvailabilityRule) -> Result<AvailabilityRule>
where
    S: SchedulingStore + ?Sized,
{
    create_rules(store, vec![rule])?
        .pop()
        .ok_or_else(|| BookingError::Storage("store returned no rule".to_string()))
}

/// Create several rules at once. Every rule is checked before any is written.
pub fn create_rules<S>(store: &S, rules: Vec<NewAvailabilityRule>) -> Result<Vec<AvailabilityRule>>
where
    S: SchedulingStore + ?Sized,
{
    for rule in &rules {
        get_event_type(store, rule.event_type_id)?;
        rule.validate()?;
    }
    let created = store.insert_availability_rules(rules)?;
    info!(count = created.len(), "created availability rules");
    Ok(created)
}

/// Update a rule. The merged rule must satisfy the same invariants as a new one.
pub fn update_rule<S>(
    store: &S,
    id: RuleId,
    update: AvailabilityRuleUpdate,
) -> Result<AvailabilityRule>
where
    S: SchedulingStore + ?Sized,
{
    let current = store
        .find_availability_rule(id)?
        .ok_or_else(|| BookingError::not_found(Entity::AvailabilityRule, id))?;
    let merged = current.merged(&update);
    merged.validate()?;
    store.replace_availability_rule(merged)
}

pub fn delete_rule<S>(store: &S, id: RuleId) -> Result<()>
where
    S: SchedulingStore + ?Sized,
{
    store.delete_availability_rule(id)
}

/// Remove every rule of an event type. Returns how many were removed.
pub fn clear_rules<S>(store: &S, event_type_id: EventTypeId) -> Result<usize>
where
    S: SchedulingStore + ?Sized,
{
    store.delete_availability_rules(event_type_id)
}
