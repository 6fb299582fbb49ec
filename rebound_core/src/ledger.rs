//! Session card credit ledger.
//!
//! Cards hold a prepaid balance of sessions. Credits are consumed when an
//! attended booking is charged and restored when a charged booking is
//! cancelled. Charging is an explicit staff action over past occurrences,
//! never an automatic side effect of booking.

use crate::store::{BookingStore, CardStore};
use crate::types::{CardStatus, SessionCard};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

impl SessionCard {
    /// Remaining balance, derived and never negative
    pub fn sessions_remaining(&self) -> u32 {
        self.total_sessions.saturating_sub(self.sessions_used)
    }

    /// Usable for a new charge: active with credit left
    pub fn is_valid(&self) -> bool {
        self.status == CardStatus::Active && self.sessions_remaining() > 0
    }

    /// Consume one credit.
    ///
    /// The card flips to `Completed` when the last credit goes. An expired
    /// or already completed card rejects the charge.
    pub fn use_session(&mut self) -> Result<()> {
        if !self.is_valid() {
            return Err(Error::InvalidCardState(format!(
                "card {} is {:?} with {} of {} sessions used",
                self.id, self.status, self.sessions_used, self.total_sessions
            )));
        }
        self.sessions_used += 1;
        if self.sessions_used >= self.total_sessions {
            self.status = CardStatus::Completed;
            tracing::info!("Card {} completed", self.id);
        }
        Ok(())
    }

    /// Restore one credit after a charged booking is cancelled.
    ///
    /// A `Completed` card reverts to `Active` once balance reappears; an
    /// `Expired` card keeps its status (expiry is a separate decision).
    /// The decrement saturates at zero.
    pub fn return_session(&mut self) {
        self.sessions_used = self.sessions_used.saturating_sub(1);
        if self.status == CardStatus::Completed && self.sessions_remaining() > 0 {
            self.status = CardStatus::Active;
            tracing::info!("Card {} reactivated by returned session", self.id);
        }
    }
}

/// Charge one attended booking against its card.
///
/// Only past occurrences may be charged, and only once per booking. A
/// booking without a card, or marked absent, is an invalid charge target.
pub fn charge_attendance<S>(store: &mut S, booking_id: Uuid, now: DateTime<Utc>) -> Result<()>
where
    S: BookingStore + CardStore,
{
    let booking = store
        .booking(booking_id)
        .ok_or_else(|| Error::NotFound(format!("booking {}", booking_id)))?;

    if booking.occurrence > now {
        return Err(Error::FutureOccurrence);
    }
    if booking.card_charged {
        return Err(Error::InvalidCardState(format!(
            "booking {} was already charged",
            booking_id
        )));
    }
    if !booking.was_present {
        return Err(Error::InvalidCardState(format!(
            "booking {} is marked absent",
            booking_id
        )));
    }
    let card_id = booking.card_id.ok_or_else(|| {
        Error::InvalidCardState(format!("booking {} has no card attached", booking_id))
    })?;

    let card = store
        .card_mut(card_id)
        .ok_or_else(|| Error::NotFound(format!("card {}", card_id)))?;
    card.use_session()?;

    // Card mutation succeeded; flip the flag so this charge is final
    if let Some(booking) = store.booking_mut(booking_id) {
        booking.card_charged = true;
    }
    tracing::info!("Charged booking {} against card {}", booking_id, card_id);
    Ok(())
}

/// Outcome of a bulk charge sweep
#[derive(Clone, Debug, Default)]
pub struct ChargeReport {
    /// Booking ids charged (or that would be, in a dry run)
    pub charged: Vec<Uuid>,
    /// Bookings skipped, with the reason
    pub skipped: Vec<(Uuid, String)>,
}

/// Sweep all past, attended, card-linked, uncharged bookings and charge
/// each one. With `dry_run` set, reports what would happen without
/// touching any card.
pub fn charge_past_sessions<S>(store: &mut S, now: DateTime<Utc>, dry_run: bool) -> ChargeReport
where
    S: BookingStore + CardStore,
{
    let candidates: Vec<Uuid> = store
        .bookings()
        .iter()
        .filter(|b| b.occurrence <= now && !b.card_charged)
        .map(|b| b.id)
        .collect();

    let mut report = ChargeReport::default();
    for id in candidates {
        if dry_run {
            let chargeable = store.booking(id).is_some_and(|b| {
                b.was_present
                    && b.card_id
                        .and_then(|cid| store.card(cid))
                        .is_some_and(SessionCard::is_valid)
            });
            if chargeable {
                report.charged.push(id);
            } else {
                report.skipped.push((id, "not chargeable".into()));
            }
            continue;
        }
        match charge_attendance(store, id, now) {
            Ok(()) => report.charged.push(id),
            Err(e) => report.skipped.push((id, e.to_string())),
        }
    }

    tracing::info!(
        "Charge sweep: {} charged, {} skipped (dry_run: {})",
        report.charged.len(),
        report.skipped.len(),
        dry_run
    );
    report
}
