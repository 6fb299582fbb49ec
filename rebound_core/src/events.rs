//! Business events: one-off sessions booked by guests through a token.
//!
//! Guests identify by name and email rather than an account. The token in
//! the shared link selects the event; a company grouping several events
//! can forbid the same guest from booking more than one of them.

use crate::resolver::resolve_category;
use crate::store::EventStore;
use crate::types::{BusinessEvent, BusinessEventBooking, Catalog, GuestDetails, MemberAttributes};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Free spots on the event right now
pub fn available_spots<S: EventStore>(store: &S, event: &BusinessEvent) -> u32 {
    let booked = store.event_bookings(event.id).len() as u32;
    event.max_capacity.saturating_sub(booked)
}

/// Book a guest onto the event behind `token`.
///
/// Category assignment is best effort: an explicitly chosen category must
/// exist, but a failed automatic resolution (say, an exotic shoe size)
/// leaves the category unset rather than rejecting the guest. Staff sort
/// out equipment on the day.
pub fn book_event<S: EventStore>(
    store: &mut S,
    catalog: &Catalog,
    token: &str,
    guest: &GuestDetails,
    now: DateTime<Utc>,
) -> Result<BusinessEventBooking> {
    let event = store
        .event_by_token(token)
        .ok_or_else(|| Error::NotFound(format!("event for token '{}'", token)))?
        .clone();

    if !event.active {
        return Err(Error::InactiveSchedule);
    }
    if !event.is_in_future(now) {
        return Err(Error::WindowClosed);
    }

    let already_here = store
        .event_bookings(event.id)
        .iter()
        .any(|b| b.email.eq_ignore_ascii_case(&guest.email));
    if already_here {
        return Err(Error::DuplicateBooking);
    }

    if let Some(company_id) = event.company_id {
        let company = store
            .company(company_id)
            .ok_or_else(|| Error::NotFound(format!("company {}", company_id)))?;
        if !company.allow_multiple_bookings {
            let booked_sibling = store
                .events_for_company(company_id)
                .iter()
                .filter(|e| e.id != event.id)
                .any(|e| {
                    store
                        .event_bookings(e.id)
                        .iter()
                        .any(|b| b.email.eq_ignore_ascii_case(&guest.email))
                });
            if booked_sibling {
                return Err(Error::DuplicateBooking);
            }
        }
    }

    if available_spots(store, &event) == 0 {
        return Err(Error::CapacityExhausted);
    }

    let category = match &guest.category {
        Some(name) => Some(
            catalog
                .categories
                .get(name)
                .map(|c| c.name.clone())
                .ok_or_else(|| {
                    Error::NoMatchingCategory(format!("category '{}' is not configured", name))
                })?,
        ),
        None => {
            let attrs = MemberAttributes {
                shoe_size: Some(guest.shoe_size.clone()),
                weight_kg: guest.weight_kg,
                override_category: None,
            };
            match resolve_category(catalog, &attrs) {
                Ok(c) => Some(c.name.clone()),
                Err(e) => {
                    tracing::warn!(
                        "Guest {} on event {}: category left unset ({})",
                        guest.email,
                        event.id,
                        e
                    );
                    None
                }
            }
        }
    };

    let booking = BusinessEventBooking {
        id: Uuid::new_v4(),
        event_id: event.id,
        first_name: guest.first_name.clone(),
        last_name: guest.last_name.clone(),
        email: guest.email.clone(),
        shoe_size: guest.shoe_size.clone(),
        weight_kg: guest.weight_kg,
        category,
        member_email: None,
        booked_at: now,
    };
    store.insert_event_booking(booking.clone())?;
    Ok(booking)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_default_catalog;
    use crate::store::MemoryStore;
    use crate::types::Company;
    use chrono::NaiveDate;

    fn at(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
            .and_utc()
    }

    fn event(token: &str, company_id: Option<Uuid>, capacity: u32) -> BusinessEvent {
        BusinessEvent {
            id: Uuid::new_v4(),
            company_id,
            title: "Teambuilding Jump".into(),
            description: String::new(),
            event_datetime: at(2024, 6, 1, 14),
            duration_minutes: 90,
            location: "Deinze Kouter 93".into(),
            max_capacity: capacity,
            token: token.into(),
            active: true,
        }
    }

    fn guest(email: &str) -> GuestDetails {
        GuestDetails {
            first_name: "An".into(),
            last_name: "Vermeulen".into(),
            email: email.into(),
            shoe_size: "38".into(),
            weight_kg: Some(62.0),
            category: None,
        }
    }

    #[test]
    fn test_guest_booking_resolves_category() {
        let mut store = MemoryStore::default();
        store.events.push(event("tok-abc", None, 20));
        let catalog = build_default_catalog();

        let booking =
            book_event(&mut store, &catalog, "tok-abc", &guest("an@example.com"), at(2024, 5, 1, 10))
                .unwrap();
        assert_eq!(booking.category.as_deref(), Some("M Standard"));
        assert_eq!(booking.member_email, None);
    }

    #[test]
    fn test_failed_resolution_leaves_category_unset() {
        let mut store = MemoryStore::default();
        store.events.push(event("tok-abc", None, 20));
        let catalog = build_default_catalog();

        let mut odd = guest("an@example.com");
        odd.shoe_size = "38.5 EU".into();
        let booking =
            book_event(&mut store, &catalog, "tok-abc", &odd, at(2024, 5, 1, 10)).unwrap();
        assert_eq!(booking.category, None);
    }

    #[test]
    fn test_explicit_category_must_exist() {
        let mut store = MemoryStore::default();
        store.events.push(event("tok-abc", None, 20));
        let catalog = build_default_catalog();

        let mut picky = guest("an@example.com");
        picky.category = Some("Purple".into());
        let result = book_event(&mut store, &catalog, "tok-abc", &picky, at(2024, 5, 1, 10));
        assert!(matches!(result, Err(Error::NoMatchingCategory(_))));
    }

    #[test]
    fn test_unknown_token_not_found() {
        let mut store = MemoryStore::default();
        let catalog = build_default_catalog();
        let result = book_event(&mut store, &catalog, "nope", &guest("an@example.com"), at(2024, 5, 1, 10));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_past_event_closed() {
        let mut store = MemoryStore::default();
        store.events.push(event("tok-abc", None, 20));
        let catalog = build_default_catalog();
        let result = book_event(
            &mut store,
            &catalog,
            "tok-abc",
            &guest("an@example.com"),
            at(2024, 6, 1, 14), // exactly at start is no longer bookable
        );
        assert!(matches!(result, Err(Error::WindowClosed)));
    }

    #[test]
    fn test_full_event_exhausted() {
        let mut store = MemoryStore::default();
        store.events.push(event("tok-abc", None, 1));
        let catalog = build_default_catalog();
        book_event(&mut store, &catalog, "tok-abc", &guest("an@example.com"), at(2024, 5, 1, 10))
            .unwrap();
        let result =
            book_event(&mut store, &catalog, "tok-abc", &guest("bo@example.com"), at(2024, 5, 1, 11));
        assert!(matches!(result, Err(Error::CapacityExhausted)));
    }

    #[test]
    fn test_same_email_on_same_event_duplicate() {
        let mut store = MemoryStore::default();
        store.events.push(event("tok-abc", None, 20));
        let catalog = build_default_catalog();
        book_event(&mut store, &catalog, "tok-abc", &guest("an@example.com"), at(2024, 5, 1, 10))
            .unwrap();
        let result = book_event(
            &mut store,
            &catalog,
            "tok-abc",
            &guest("AN@example.com"),
            at(2024, 5, 1, 11),
        );
        assert!(matches!(result, Err(Error::DuplicateBooking)));
    }

    #[test]
    fn test_company_single_booking_policy_spans_events() {
        let mut store = MemoryStore::default();
        let company = Company {
            id: Uuid::new_v4(),
            name: "Acme".into(),
            contact_email: "hr@acme.example".into(),
            token: "acme".into(),
            allow_multiple_bookings: false,
            active: true,
        };
        let company_id = company.id;
        store.companies.push(company);
        store.events.push(event("tok-one", Some(company_id), 20));
        store.events.push(event("tok-two", Some(company_id), 20));

        let catalog = build_default_catalog();
        book_event(&mut store, &catalog, "tok-one", &guest("an@example.com"), at(2024, 5, 1, 10))
            .unwrap();
        let result =
            book_event(&mut store, &catalog, "tok-two", &guest("an@example.com"), at(2024, 5, 1, 11));
        assert!(matches!(result, Err(Error::DuplicateBooking)));
    }

    #[test]
    fn test_company_multiple_bookings_allowed_when_enabled() {
        let mut store = MemoryStore::default();
        let company = Company {
            id: Uuid::new_v4(),
            name: "Acme".into(),
            contact_email: "hr@acme.example".into(),
            token: "acme".into(),
            allow_multiple_bookings: true,
            active: true,
        };
        let company_id = company.id;
        store.companies.push(company);
        store.events.push(event("tok-one", Some(company_id), 20));
        store.events.push(event("tok-two", Some(company_id), 20));

        let catalog = build_default_catalog();
        book_event(&mut store, &catalog, "tok-one", &guest("an@example.com"), at(2024, 5, 1, 10))
            .unwrap();
        book_event(&mut store, &catalog, "tok-two", &guest("an@example.com"), at(2024, 5, 1, 11))
            .unwrap();
        assert_eq!(store.event_bookings.len(), 2);
    }

    #[test]
    fn test_inactive_event_rejected() {
        let mut store = MemoryStore::default();
        let mut ev = event("tok-abc", None, 20);
        ev.active = false;
        store.events.push(ev);
        let catalog = build_default_catalog();
        let result =
            book_event(&mut store, &catalog, "tok-abc", &guest("an@example.com"), at(2024, 5, 1, 10));
        assert!(matches!(result, Err(Error::InactiveSchedule)));
    }

    #[test]
    fn test_available_spots_counts_down() {
        let mut store = MemoryStore::default();
        let ev = event("tok-abc", None, 3);
        store.events.push(ev.clone());
        let catalog = build_default_catalog();
        assert_eq!(available_spots(&store, &ev), 3);
        book_event(&mut store, &catalog, "tok-abc", &guest("an@example.com"), at(2024, 5, 1, 10))
            .unwrap();
        assert_eq!(available_spots(&store, &ev), 2);
    }
}
