//! Capacity calculation per category and per occurrence.
//!
//! Free spots in a category are driven purely by live counts: available
//! equipment items minus existing bookings, then capped by the schedule's
//! aggregate capacity when one is set. Nothing here is cached; a repaired
//! item or a cancellation is reflected on the next call.

use crate::store::{BookingStore, EquipmentInventory};
use crate::types::{Catalog, ScheduleDefinition};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Free spots in one category for one occurrence.
///
/// `max(0, available items - bookings in category)`, further limited by
/// the remaining aggregate headroom when `max_capacity` is set. Never
/// negative even when equipment breaks under existing bookings.
pub fn category_availability<S>(
    store: &S,
    schedule: &ScheduleDefinition,
    occurrence: DateTime<Utc>,
    category: &str,
) -> usize
where
    S: EquipmentInventory + BookingStore,
{
    let items = store.available_count(category);
    let booked = store.count_in_category(occurrence, &schedule.title, category);
    let free = items.saturating_sub(booked);

    match schedule.max_capacity {
        Some(cap) => {
            let total = store.count_for_occurrence(occurrence, &schedule.title);
            let headroom = (cap as usize).saturating_sub(total);
            free.min(headroom)
        }
        None => free,
    }
}

/// Free spots across all active categories for one occurrence.
///
/// The sum of per-category availability, capped by the aggregate headroom.
pub fn aggregate_availability<S>(
    store: &S,
    catalog: &Catalog,
    schedule: &ScheduleDefinition,
    occurrence: DateTime<Utc>,
) -> usize
where
    S: EquipmentInventory + BookingStore,
{
    let per_category: usize = catalog
        .active_categories()
        .iter()
        .map(|c| {
            let items = store.available_count(&c.name);
            let booked = store.count_in_category(occurrence, &schedule.title, &c.name);
            items.saturating_sub(booked)
        })
        .sum();

    match schedule.max_capacity {
        Some(cap) => {
            let total = store.count_for_occurrence(occurrence, &schedule.title);
            per_category.min((cap as usize).saturating_sub(total))
        }
        None => per_category,
    }
}

/// Per-category availability breakdown, keyed by category name
pub fn availability_breakdown<S>(
    store: &S,
    catalog: &Catalog,
    schedule: &ScheduleDefinition,
    occurrence: DateTime<Utc>,
) -> BTreeMap<String, usize>
where
    S: EquipmentInventory + BookingStore,
{
    catalog
        .active_categories()
        .iter()
        .map(|c| {
            (
                c.name.clone(),
                category_availability(store, schedule, occurrence, &c.name),
            )
        })
        .collect()
}
