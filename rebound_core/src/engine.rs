//! Booking orchestrator: the single entry point for placing and
//! cancelling member bookings.
//!
//! `book_session` runs the full gate sequence (identity, schedule,
//! occurrence validity, category resolution, booking window, capacity)
//! and hands the final uniqueness check to the store, which enforces it
//! as an insert constraint. The first failing gate wins; later gates are
//! never consulted.

use crate::capacity::category_availability;
use crate::resolver::resolve_category;
use crate::schedule::{occurrence_matches, window_opens_at, window_state, WindowState};
use crate::store::{BookingStore, CardStore, Directory, EquipmentInventory};
use crate::types::{Booking, Catalog};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Everything needed to place one booking
#[derive(Clone, Debug)]
pub struct BookingRequest {
    pub member_email: String,
    pub schedule_id: String,
    pub occurrence: DateTime<Utc>,
}

/// Place a booking for one member on one occurrence.
///
/// Cards are attached but never charged here; charging is a separate
/// staff action after the session (see the ledger module).
pub fn book_session<S>(
    store: &mut S,
    catalog: &Catalog,
    request: &BookingRequest,
    now: DateTime<Utc>,
) -> Result<Booking>
where
    S: BookingStore + CardStore + Directory + EquipmentInventory,
{
    let member = store
        .member(&request.member_email)
        .ok_or_else(|| Error::NotFound(format!("member {}", request.member_email)))?
        .clone();

    let schedule = store
        .schedule(&request.schedule_id)
        .ok_or_else(|| Error::NotFound(format!("schedule {}", request.schedule_id)))?
        .clone();
    if !schedule.active {
        return Err(Error::InactiveSchedule);
    }
    if !occurrence_matches(&schedule, request.occurrence) {
        return Err(Error::InvalidOccurrence);
    }

    let category = resolve_category(catalog, &member.attributes())?.name.clone();

    match window_state(&schedule, request.occurrence, now) {
        WindowState::NotYetOpen => {
            return Err(Error::WindowNotOpenYet {
                opens_at: window_opens_at(&schedule, request.occurrence),
            });
        }
        WindowState::Closed => return Err(Error::WindowClosed),
        WindowState::Open => {}
    }

    if category_availability(store, &schedule, request.occurrence, &category) == 0 {
        return Err(Error::CapacityExhausted);
    }

    let card_id = store.active_card_for(&member.email).map(|c| c.id);

    let booking = Booking {
        id: Uuid::new_v4(),
        schedule_id: schedule.id.clone(),
        title: schedule.title.clone(),
        occurrence: request.occurrence,
        member_email: member.email.clone(),
        category: Some(category),
        location: schedule.location.clone(),
        card_id,
        card_charged: false,
        // Members are assumed present unless staff marks them absent
        was_present: true,
        booked_at: now,
    };
    store.insert_booking(booking.clone())?;
    Ok(booking)
}

/// Cancel one of the member's own future bookings.
///
/// A credit consumed for this booking is returned to the card exactly
/// once; uncharged bookings release only their capacity slot. Past
/// occurrences stay on record and cannot be cancelled.
pub fn cancel_booking<S>(
    store: &mut S,
    member_email: &str,
    booking_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Booking>
where
    S: BookingStore + CardStore,
{
    let booking = store
        .booking(booking_id)
        .filter(|b| b.member_email.eq_ignore_ascii_case(member_email))
        .ok_or_else(|| Error::NotFound(format!("booking {}", booking_id)))?;

    if booking.occurrence <= now {
        return Err(Error::PastOccurrence);
    }

    let removed = store
        .remove_booking(booking_id)
        .ok_or_else(|| Error::NotFound(format!("booking {}", booking_id)))?;

    if removed.card_charged {
        if let Some(card_id) = removed.card_id {
            if let Some(card) = store.card_mut(card_id) {
                card.return_session();
                tracing::info!(
                    "Returned session to card {} for cancelled booking {}",
                    card_id,
                    booking_id
                );
            }
        }
    }

    tracing::info!("Cancelled booking {} for {}", booking_id, member_email);
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_default_catalog;
    use crate::store::MemoryStore;
    use crate::types::*;
    use chrono::NaiveDate;

    fn member(email: &str, shoe: &str, weight: f64) -> Member {
        Member {
            email: email.into(),
            first_name: "Jan".into(),
            last_name: "Peeters".into(),
            phone: String::new(),
            shoe_size: Some(shoe.into()),
            weight_kg: Some(weight),
            override_category: None,
        }
    }

    fn schedule() -> ScheduleDefinition {
        ScheduleDefinition {
            id: "mon-1900".into(),
            title: "Jump Session".into(),
            description: String::new(),
            weekday: 0,
            start_time: chrono::NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
            duration_minutes: 60,
            location: "Deinze Kouter 93".into(),
            max_capacity: Some(15),
            opens_days_before: 14,
            closes_hours_before: 2,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: None,
            active: true,
        }
    }

    fn at(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
            .and_utc()
    }

    // Monday 2024-01-15 at 19:00
    fn occurrence() -> DateTime<Utc> {
        at(2024, 1, 15, 19)
    }

    fn seeded_store() -> MemoryStore {
        let mut store = MemoryStore::default();
        store.insert_member(member("jan@example.com", "44", 90.0));
        store.insert_schedule(schedule());
        // L HD equipment to back Jan's resolved category
        for i in 0..5 {
            store.equipment.push(EquipmentItem {
                id: format!("lhd-{}", i),
                name: format!("Boots lhd-{}", i),
                category: Some("L HD".into()),
                status: EquipmentStatus::Available,
                purchase_date: None,
                last_maintenance: None,
                notes: String::new(),
            });
        }
        store
    }

    fn request() -> BookingRequest {
        BookingRequest {
            member_email: "jan@example.com".into(),
            schedule_id: "mon-1900".into(),
            occurrence: occurrence(),
        }
    }

    #[test]
    fn test_successful_booking_resolves_category_and_attaches_card() {
        let mut store = seeded_store();
        let card = SessionCard {
            id: Uuid::new_v4(),
            member_email: "jan@example.com".into(),
            card_type: "10 Sessions".into(),
            trial: false,
            total_sessions: 10,
            sessions_used: 0,
            purchased_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            expiry_date: None,
            status: CardStatus::Active,
            notes: String::new(),
        };
        let card_id = card.id;
        store.insert_card(card);

        let catalog = build_default_catalog();
        let booking = book_session(&mut store, &catalog, &request(), at(2024, 1, 10, 12)).unwrap();

        assert_eq!(booking.category.as_deref(), Some("L HD"));
        assert_eq!(booking.card_id, Some(card_id));
        assert!(!booking.card_charged);
        assert!(booking.was_present);
        // Attached at booking time means not yet consumed
        assert_eq!(store.card(card_id).unwrap().sessions_used, 0);
        assert_eq!(store.bookings.len(), 1);
    }

    #[test]
    fn test_booking_without_card_still_succeeds() {
        let mut store = seeded_store();
        let catalog = build_default_catalog();
        let booking = book_session(&mut store, &catalog, &request(), at(2024, 1, 10, 12)).unwrap();
        assert_eq!(booking.card_id, None);
    }

    #[test]
    fn test_window_not_open_reports_opening_instant() {
        let mut store = seeded_store();
        let catalog = build_default_catalog();
        // 2023-12-20 is well before occurrence - 14 days
        let result = book_session(&mut store, &catalog, &request(), at(2023, 12, 20, 12));
        match result {
            Err(Error::WindowNotOpenYet { opens_at }) => {
                assert_eq!(opens_at, at(2024, 1, 1, 19));
            }
            other => panic!("expected WindowNotOpenYet, got {:?}", other),
        }
    }

    #[test]
    fn test_window_closed_inside_cutoff() {
        let mut store = seeded_store();
        let catalog = build_default_catalog();
        let result = book_session(&mut store, &catalog, &request(), at(2024, 1, 15, 18));
        assert!(matches!(result, Err(Error::WindowClosed)));
    }

    #[test]
    fn test_capacity_exhausted_in_members_category() {
        let mut store = seeded_store();
        // Fill all 5 L HD items with other members' bookings
        for i in 0..5 {
            store
                .insert_booking(Booking {
                    id: Uuid::new_v4(),
                    schedule_id: "mon-1900".into(),
                    title: "Jump Session".into(),
                    occurrence: occurrence(),
                    member_email: format!("other{}@example.com", i),
                    category: Some("L HD".into()),
                    location: "Deinze".into(),
                    card_id: None,
                    card_charged: false,
                    was_present: true,
                    booked_at: at(2024, 1, 9, 10),
                })
                .unwrap();
        }
        let catalog = build_default_catalog();
        let result = book_session(&mut store, &catalog, &request(), at(2024, 1, 10, 12));
        assert!(matches!(result, Err(Error::CapacityExhausted)));
    }

    #[test]
    fn test_duplicate_booking_rejected() {
        let mut store = seeded_store();
        let catalog = build_default_catalog();
        book_session(&mut store, &catalog, &request(), at(2024, 1, 10, 12)).unwrap();
        let again = book_session(&mut store, &catalog, &request(), at(2024, 1, 10, 13));
        assert!(matches!(again, Err(Error::DuplicateBooking)));
    }

    #[test]
    fn test_incomplete_profile_fails_before_window_check() {
        let mut store = seeded_store();
        store.insert_member(Member {
            email: "new@example.com".into(),
            first_name: "New".into(),
            last_name: "Member".into(),
            phone: String::new(),
            shoe_size: None,
            weight_kg: None,
            override_category: None,
        });
        let catalog = build_default_catalog();
        let result = book_session(
            &mut store,
            &catalog,
            &BookingRequest {
                member_email: "new@example.com".into(),
                schedule_id: "mon-1900".into(),
                occurrence: occurrence(),
            },
            // Window would not be open yet; profile error must win
            at(2023, 12, 20, 12),
        );
        assert!(matches!(result, Err(Error::IncompleteProfile(_))));
    }

    #[test]
    fn test_inactive_schedule_rejected() {
        let mut store = seeded_store();
        store.schedules.get_mut("mon-1900").unwrap().active = false;
        let catalog = build_default_catalog();
        let result = book_session(&mut store, &catalog, &request(), at(2024, 1, 10, 12));
        assert!(matches!(result, Err(Error::InactiveSchedule)));
    }

    #[test]
    fn test_fabricated_occurrence_rejected() {
        let mut store = seeded_store();
        let catalog = build_default_catalog();
        // Tuesday at 19:00 is not an occurrence of a Monday schedule
        let result = book_session(
            &mut store,
            &catalog,
            &BookingRequest {
                member_email: "jan@example.com".into(),
                schedule_id: "mon-1900".into(),
                occurrence: at(2024, 1, 16, 19),
            },
            at(2024, 1, 10, 12),
        );
        assert!(matches!(result, Err(Error::InvalidOccurrence)));
    }

    #[test]
    fn test_unknown_member_rejected() {
        let mut store = seeded_store();
        let catalog = build_default_catalog();
        let result = book_session(
            &mut store,
            &catalog,
            &BookingRequest {
                member_email: "ghost@example.com".into(),
                schedule_id: "mon-1900".into(),
                occurrence: occurrence(),
            },
            at(2024, 1, 10, 12),
        );
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_cancel_uncharged_booking_releases_slot_only() {
        let mut store = seeded_store();
        let catalog = build_default_catalog();
        let booking = book_session(&mut store, &catalog, &request(), at(2024, 1, 10, 12)).unwrap();

        cancel_booking(&mut store, "jan@example.com", booking.id, at(2024, 1, 11, 12)).unwrap();
        assert!(store.bookings.is_empty());
    }

    #[test]
    fn test_cancel_charged_booking_returns_credit_once() {
        // Scenario: a charged booking is cancelled while still in the
        // future (staff charged it early by mistake); the credit returns.
        let mut store = seeded_store();
        let card = SessionCard {
            id: Uuid::new_v4(),
            member_email: "jan@example.com".into(),
            card_type: "10 Sessions".into(),
            trial: false,
            total_sessions: 10,
            sessions_used: 4,
            purchased_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            expiry_date: None,
            status: CardStatus::Active,
            notes: String::new(),
        };
        let card_id = card.id;
        store.insert_card(card);

        let catalog = build_default_catalog();
        let booking = book_session(&mut store, &catalog, &request(), at(2024, 1, 10, 12)).unwrap();
        store.booking_mut(booking.id).unwrap().card_charged = true;
        store.card_mut(card_id).unwrap().sessions_used = 5;

        cancel_booking(&mut store, "jan@example.com", booking.id, at(2024, 1, 11, 12)).unwrap();
        assert_eq!(store.card(card_id).unwrap().sessions_used, 4);
    }

    #[test]
    fn test_cancel_past_booking_rejected() {
        let mut store = seeded_store();
        let catalog = build_default_catalog();
        let booking = book_session(&mut store, &catalog, &request(), at(2024, 1, 10, 12)).unwrap();

        let result = cancel_booking(&mut store, "jan@example.com", booking.id, at(2024, 1, 20, 12));
        assert!(matches!(result, Err(Error::PastOccurrence)));
        assert_eq!(store.bookings.len(), 1);
    }

    #[test]
    fn test_cannot_cancel_someone_elses_booking() {
        let mut store = seeded_store();
        let catalog = build_default_catalog();
        let booking = book_session(&mut store, &catalog, &request(), at(2024, 1, 10, 12)).unwrap();

        let result = cancel_booking(&mut store, "mallory@example.com", booking.id, at(2024, 1, 11, 12));
        assert!(matches!(result, Err(Error::NotFound(_))));
        assert_eq!(store.bookings.len(), 1);
    }
}
