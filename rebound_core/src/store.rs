//! Storage boundary contracts and the in-memory store.
//!
//! The engine reads and writes entities only through the traits defined
//! here; persistence technology stays behind them. `MemoryStore` is the
//! built-in implementation: plain collections with JSON load/save under
//! file locking, suitable for the CLI and for tests.
//!
//! Booking uniqueness per `(member, occurrence, title)` is enforced by the
//! store itself on insert, so a constraint violation surfaces as
//! `DuplicateBooking` instead of being trusted to a pre-check.

use crate::types::*;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Read-only inventory query: which physical items back a category
pub trait EquipmentInventory {
    /// Items with status `available` in the given category
    fn available_items(&self, category: &str) -> Vec<&EquipmentItem>;

    fn available_count(&self, category: &str) -> usize {
        self.available_items(category).len()
    }
}

/// Booking records keyed by `(occurrence, member identity, title)`
pub trait BookingStore {
    fn booking(&self, id: Uuid) -> Option<&Booking>;
    fn booking_mut(&mut self, id: Uuid) -> Option<&mut Booking>;
    fn bookings(&self) -> &[Booking];
    fn bookings_for_occurrence(&self, occurrence: DateTime<Utc>, title: &str) -> Vec<&Booking>;

    /// Insert; fails with `DuplicateBooking` on a uniqueness violation
    fn insert_booking(&mut self, booking: Booking) -> Result<()>;
    fn remove_booking(&mut self, id: Uuid) -> Option<Booking>;

    fn count_for_occurrence(&self, occurrence: DateTime<Utc>, title: &str) -> usize {
        self.bookings_for_occurrence(occurrence, title).len()
    }

    fn count_in_category(
        &self,
        occurrence: DateTime<Utc>,
        title: &str,
        category: &str,
    ) -> usize {
        self.bookings_for_occurrence(occurrence, title)
            .iter()
            .filter(|b| b.category.as_deref() == Some(category))
            .count()
    }

    fn has_booking(&self, member_email: &str, occurrence: DateTime<Utc>, title: &str) -> bool {
        self.bookings_for_occurrence(occurrence, title)
            .iter()
            .any(|b| b.member_email.eq_ignore_ascii_case(member_email))
    }
}

/// Session card records, read and mutated per card
pub trait CardStore {
    fn card(&self, id: Uuid) -> Option<&SessionCard>;
    fn card_mut(&mut self, id: Uuid) -> Option<&mut SessionCard>;

    /// The member's first active card, oldest purchase first
    fn active_card_for(&self, member_email: &str) -> Option<&SessionCard>;
}

/// Read-only member and schedule lookups
pub trait Directory {
    fn member(&self, email: &str) -> Option<&Member>;
    fn schedule(&self, id: &str) -> Option<&ScheduleDefinition>;
}

/// Business events, their guest bookings, and the owning companies
pub trait EventStore {
    fn event(&self, id: Uuid) -> Option<&BusinessEvent>;
    fn event_by_token(&self, token: &str) -> Option<&BusinessEvent>;
    fn company(&self, id: Uuid) -> Option<&Company>;
    fn events_for_company(&self, company_id: Uuid) -> Vec<&BusinessEvent>;
    fn event_bookings(&self, event_id: Uuid) -> Vec<&BusinessEventBooking>;
    fn insert_event_booking(&mut self, booking: BusinessEventBooking) -> Result<()>;
}

/// In-memory store over plain collections, persisted as one JSON file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    pub equipment: Vec<EquipmentItem>,
    #[serde(default)]
    pub members: BTreeMap<String, Member>,
    #[serde(default)]
    pub schedules: BTreeMap<String, ScheduleDefinition>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub cards: Vec<SessionCard>,
    #[serde(default)]
    pub companies: Vec<Company>,
    #[serde(default)]
    pub events: Vec<BusinessEvent>,
    #[serde(default)]
    pub event_bookings: Vec<BusinessEventBooking>,
}

impl MemoryStore {
    /// Load a store from a file with shared locking.
    ///
    /// A missing file yields an empty store; a corrupted file is an error
    /// (silently dropping booking data would be worse than failing).
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No store file at {:?}, starting empty", path);
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read_result = reader.read_to_string(&mut contents);
        file.unlock()?;
        read_result?;

        let store: MemoryStore = serde_json::from_str(&contents)?;
        tracing::debug!(
            "Loaded store from {:?} ({} bookings, {} members)",
            path,
            store.bookings.len(),
            store.members.len()
        );
        Ok(store)
    }

    /// Save the store with exclusive locking and an atomic rename
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "store path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;
        tracing::debug!("Saved store to {:?}", path);
        Ok(())
    }

    /// Load, modify, and save back atomically from the caller's view
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut MemoryStore) -> Result<()>,
    {
        let mut store = Self::load(path)?;
        f(&mut store)?;
        store.save(path)?;
        Ok(store)
    }

    pub fn insert_member(&mut self, member: Member) {
        self.members.insert(member.email.to_lowercase(), member);
    }

    pub fn insert_schedule(&mut self, schedule: ScheduleDefinition) {
        self.schedules.insert(schedule.id.clone(), schedule);
    }

    pub fn insert_card(&mut self, card: SessionCard) {
        self.cards.push(card);
        self.cards.sort_by_key(|c| c.purchased_date);
    }
}

impl EquipmentInventory for MemoryStore {
    fn available_items(&self, category: &str) -> Vec<&EquipmentItem> {
        self.equipment
            .iter()
            .filter(|e| e.is_available() && e.category.as_deref() == Some(category))
            .collect()
    }
}

impl BookingStore for MemoryStore {
    fn booking(&self, id: Uuid) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    fn booking_mut(&mut self, id: Uuid) -> Option<&mut Booking> {
        self.bookings.iter_mut().find(|b| b.id == id)
    }

    fn bookings(&self) -> &[Booking] {
        &self.bookings
    }

    fn bookings_for_occurrence(&self, occurrence: DateTime<Utc>, title: &str) -> Vec<&Booking> {
        self.bookings
            .iter()
            .filter(|b| b.occurrence == occurrence && b.title == title)
            .collect()
    }

    fn insert_booking(&mut self, booking: Booking) -> Result<()> {
        // Uniqueness constraint lives here, not in a caller pre-check
        if self.has_booking(&booking.member_email, booking.occurrence, &booking.title) {
            return Err(Error::DuplicateBooking);
        }
        tracing::info!(
            "Booking {} created for {} at {}",
            booking.id,
            booking.member_email,
            booking.occurrence
        );
        self.bookings.push(booking);
        Ok(())
    }

    fn remove_booking(&mut self, id: Uuid) -> Option<Booking> {
        let index = self.bookings.iter().position(|b| b.id == id)?;
        Some(self.bookings.remove(index))
    }
}

impl CardStore for MemoryStore {
    fn card(&self, id: Uuid) -> Option<&SessionCard> {
        self.cards.iter().find(|c| c.id == id)
    }

    fn card_mut(&mut self, id: Uuid) -> Option<&mut SessionCard> {
        self.cards.iter_mut().find(|c| c.id == id)
    }

    fn active_card_for(&self, member_email: &str) -> Option<&SessionCard> {
        self.cards.iter().find(|c| {
            c.member_email.eq_ignore_ascii_case(member_email)
                && c.status == CardStatus::Active
                && c.sessions_used < c.total_sessions
        })
    }
}

impl Directory for MemoryStore {
    fn member(&self, email: &str) -> Option<&Member> {
        self.members.get(&email.to_lowercase())
    }

    fn schedule(&self, id: &str) -> Option<&ScheduleDefinition> {
        self.schedules.get(id)
    }
}

impl EventStore for MemoryStore {
    fn event(&self, id: Uuid) -> Option<&BusinessEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    fn event_by_token(&self, token: &str) -> Option<&BusinessEvent> {
        self.events.iter().find(|e| e.token == token)
    }

    fn company(&self, id: Uuid) -> Option<&Company> {
        self.companies.iter().find(|c| c.id == id)
    }

    fn events_for_company(&self, company_id: Uuid) -> Vec<&BusinessEvent> {
        self.events
            .iter()
            .filter(|e| e.company_id == Some(company_id))
            .collect()
    }

    fn event_bookings(&self, event_id: Uuid) -> Vec<&BusinessEventBooking> {
        self.event_bookings
            .iter()
            .filter(|b| b.event_id == event_id)
            .collect()
    }

    fn insert_event_booking(&mut self, booking: BusinessEventBooking) -> Result<()> {
        let already = self
            .event_bookings
            .iter()
            .any(|b| b.event_id == booking.event_id && b.email.eq_ignore_ascii_case(&booking.email));
        if already {
            return Err(Error::DuplicateBooking);
        }
        tracing::info!(
            "Event booking {} created for {} on event {}",
            booking.id,
            booking.email,
            booking.event_id
        );
        self.event_bookings.push(booking);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn booking_at(email: &str, occurrence: DateTime<Utc>) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            schedule_id: "mon-1900".into(),
            title: "Jump Session".into(),
            occurrence,
            member_email: email.into(),
            category: Some("M Standard".into()),
            location: "Deinze".into(),
            card_id: None,
            card_charged: false,
            was_present: true,
            booked_at: Utc::now(),
        }
    }

    fn occurrence() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(19, 0, 0)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn test_duplicate_insert_rejected_by_store() {
        let mut store = MemoryStore::default();
        store
            .insert_booking(booking_at("jan@example.com", occurrence()))
            .unwrap();

        let result = store.insert_booking(booking_at("jan@example.com", occurrence()));
        assert!(matches!(result, Err(Error::DuplicateBooking)));

        // Same member, different occurrence is fine
        let other = occurrence() + chrono::Duration::days(7);
        store
            .insert_booking(booking_at("jan@example.com", other))
            .unwrap();
        assert_eq!(store.bookings.len(), 2);
    }

    #[test]
    fn test_category_counts() {
        let mut store = MemoryStore::default();
        store
            .insert_booking(booking_at("a@example.com", occurrence()))
            .unwrap();
        let mut hd = booking_at("b@example.com", occurrence());
        hd.category = Some("L HD".into());
        store.insert_booking(hd).unwrap();

        assert_eq!(store.count_for_occurrence(occurrence(), "Jump Session"), 2);
        assert_eq!(
            store.count_in_category(occurrence(), "Jump Session", "M Standard"),
            1
        );
        assert_eq!(
            store.count_in_category(occurrence(), "Jump Session", "L HD"),
            1
        );
    }

    #[test]
    fn test_active_card_skips_exhausted_and_expired() {
        let mut store = MemoryStore::default();
        let member = "jan@example.com";
        let mk = |status, used, purchased_day| SessionCard {
            id: Uuid::new_v4(),
            member_email: member.into(),
            card_type: "10 Sessions".into(),
            trial: false,
            total_sessions: 10,
            sessions_used: used,
            purchased_date: NaiveDate::from_ymd_opt(2024, 1, purchased_day).unwrap(),
            expiry_date: None,
            status,
            notes: String::new(),
        };
        store.insert_card(mk(CardStatus::Completed, 10, 1));
        store.insert_card(mk(CardStatus::Expired, 2, 2));
        let usable = mk(CardStatus::Active, 3, 3);
        let usable_id = usable.id;
        store.insert_card(usable);

        assert_eq!(store.active_card_for(member).map(|c| c.id), Some(usable_id));
        assert!(store.active_card_for("other@example.com").is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("store.json");

        let mut store = MemoryStore::default();
        store.insert_member(Member {
            email: "jan@example.com".into(),
            first_name: "Jan".into(),
            last_name: "Peeters".into(),
            phone: String::new(),
            shoe_size: Some("44".into()),
            weight_kg: Some(90.0),
            override_category: None,
        });
        store
            .insert_booking(booking_at("jan@example.com", occurrence()))
            .unwrap();
        store.save(&path).unwrap();

        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.members.len(), 1);
        assert_eq!(loaded.bookings.len(), 1);
        assert!(loaded.member("JAN@example.com").is_some());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::load(&temp_dir.path().join("nope.json")).unwrap();
        assert!(store.bookings.is_empty());
    }

    #[test]
    fn test_load_corrupted_file_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, "{ not json }").unwrap();
        assert!(matches!(MemoryStore::load(&path), Err(Error::Json(_))));
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("store.json");

        MemoryStore::default().save(&path).unwrap();
        MemoryStore::update(&path, |store| {
            store.insert_booking(booking_at("jan@example.com", occurrence()))
        })
        .unwrap();

        let loaded = MemoryStore::load(&path).unwrap();
        assert_eq!(loaded.bookings.len(), 1);
    }
}
