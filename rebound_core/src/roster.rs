//! Attendance roster export.
//!
//! Writes the attendee list for one occurrence as CSV, the sheet staff
//! print (or pull up) at the door: who is coming, which equipment
//! category to stage for them, and the card state at a glance.

use crate::store::{BookingStore, CardStore, Directory};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// One row of the attendance sheet
#[derive(Debug, Serialize)]
pub struct RosterRow {
    pub name: String,
    pub email: String,
    pub category: String,
    pub card: String,
    pub charged: bool,
    pub present: bool,
}

/// Build the roster rows for one occurrence, sorted by attendee name
pub fn roster_rows<S>(store: &S, occurrence: DateTime<Utc>, title: &str) -> Vec<RosterRow>
where
    S: BookingStore + CardStore + Directory,
{
    let mut rows: Vec<RosterRow> = store
        .bookings_for_occurrence(occurrence, title)
        .into_iter()
        .map(|booking| {
            let name = store
                .member(&booking.member_email)
                .map(|m| m.full_name())
                .unwrap_or_else(|| booking.member_email.clone());
            let card = booking
                .card_id
                .and_then(|id| store.card(id))
                .map(|c| format!("{} ({}/{})", c.card_type, c.sessions_used, c.total_sessions))
                .unwrap_or_else(|| "no card".into());
            RosterRow {
                name,
                email: booking.member_email.clone(),
                category: booking.category.clone().unwrap_or_default(),
                card,
                charged: booking.card_charged,
                present: booking.was_present,
            }
        })
        .collect();
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    rows
}

/// Write the roster for one occurrence to a CSV file.
///
/// Returns the number of attendee rows written.
pub fn write_roster<S>(
    store: &S,
    occurrence: DateTime<Utc>,
    title: &str,
    path: &Path,
) -> Result<usize>
where
    S: BookingStore + CardStore + Directory,
{
    let rows = roster_rows(store, occurrence, title);
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    // Written explicitly so an empty roster still gets its header
    writer.write_record(["name", "email", "category", "card", "charged", "present"])?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    tracing::info!(
        "Wrote roster for '{}' at {} ({} attendees) to {:?}",
        title,
        occurrence,
        rows.len(),
        path
    );
    Ok(rows.len())
}
