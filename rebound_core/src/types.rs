//! Core domain types for the booking engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Equipment classes, categories and physical items
//! - Members and their resolvable attributes
//! - Recurring schedule definitions and bookings
//! - Prepaid session cards (the credit ledger account)
//! - One-off business events and their guest bookings

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

// ============================================================================
// Equipment Classes and Categories
// ============================================================================

/// Shoe-size class with an optional inclusive numeric range.
///
/// Open-ended bounds are allowed (e.g. "XL" = 47 and up). A class with
/// neither bound set is never matched automatically.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SizeClass {
    pub name: String,
    pub min_shoe_size: Option<i32>,
    pub max_shoe_size: Option<i32>,
    pub active: bool,
}

impl SizeClass {
    /// Whether this class covers the given shoe size.
    pub fn contains(&self, shoe_size: i32) -> bool {
        if self.min_shoe_size.is_none() && self.max_shoe_size.is_none() {
            return false;
        }
        self.min_shoe_size.map_or(true, |min| shoe_size >= min)
            && self.max_shoe_size.map_or(true, |max| shoe_size <= max)
    }
}

/// Spring class with an optional maximum supported body weight.
///
/// A class with no maximum is the catch-all/heaviest-duty class.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpringClass {
    pub name: String,
    pub max_weight_kg: Option<f64>,
    pub active: bool,
}

/// Shell class: cosmetic/compatibility tag, never a resolution criterion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShellClass {
    pub name: String,
    pub active: bool,
}

/// One capacity pool of interchangeable equipment, defined by a unique
/// (size class, spring class) pair plus an optional display-only shell.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EquipmentCategory {
    pub name: String,
    pub size_class: String,
    pub spring_class: String,
    pub shell_class: Option<String>,
    pub active: bool,
}

/// The complete registry of classes and equipment categories
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub size_classes: HashMap<String, SizeClass>,
    pub spring_classes: HashMap<String, SpringClass>,
    pub shell_classes: HashMap<String, ShellClass>,
    pub categories: HashMap<String, EquipmentCategory>,
}

// ============================================================================
// Equipment Items
// ============================================================================

/// Physical status of one equipment item
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    Available,
    Maintenance,
    Broken,
}

/// One physical equipment item.
///
/// Status is mutated by the maintenance workflow (external); items are
/// never deleted while referenced by historical bookings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EquipmentItem {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub status: EquipmentStatus,
    pub purchase_date: Option<NaiveDate>,
    pub last_maintenance: Option<NaiveDate>,
    pub notes: String,
}

impl EquipmentItem {
    pub fn is_available(&self) -> bool {
        self.status == EquipmentStatus::Available
    }
}

// ============================================================================
// Members
// ============================================================================

/// The physical attributes category resolution runs on.
///
/// `override_category`, when set, bypasses automatic resolution entirely
/// until an administrator clears it.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MemberAttributes {
    pub shoe_size: Option<String>,
    pub weight_kg: Option<f64>,
    pub override_category: Option<String>,
}

/// A member identity plus the profile fields the resolver needs
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Member {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub shoe_size: Option<String>,
    pub weight_kg: Option<f64>,
    pub override_category: Option<String>,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn attributes(&self) -> MemberAttributes {
        MemberAttributes {
            shoe_size: self.shoe_size.clone(),
            weight_kg: self.weight_kg,
            override_category: self.override_category.clone(),
        }
    }
}

// ============================================================================
// Schedules and Bookings
// ============================================================================

/// A recurring schedule definition: weekday + time + validity window.
///
/// Concrete occurrences are derived values identified by
/// `(schedule id, date-time)`; they are never stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScheduleDefinition {
    pub id: String,
    pub title: String,
    pub description: String,
    /// 0 = Monday .. 6 = Sunday
    pub weekday: u8,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
    pub location: String,
    /// Aggregate cap across all categories combined, if set
    pub max_capacity: Option<u32>,
    pub opens_days_before: u32,
    pub closes_hours_before: u32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub active: bool,
}

/// A member's reservation for one occurrence.
///
/// `card_charged` records whether a credit was actually consumed for this
/// booking, independent of the card's own state, so cancellation credits
/// at most once.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub schedule_id: String,
    pub title: String,
    pub occurrence: DateTime<Utc>,
    pub member_email: String,
    pub category: Option<String>,
    pub location: String,
    pub card_id: Option<Uuid>,
    pub card_charged: bool,
    pub was_present: bool,
    pub booked_at: DateTime<Utc>,
}

// ============================================================================
// Session Cards (Credit Ledger)
// ============================================================================

/// Credit ledger account status
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    Active,
    Expired,
    Completed,
}

/// A prepaid balance of usable sessions for one member.
///
/// `sessions_remaining` is always derived from total minus used, never
/// stored independently.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionCard {
    pub id: Uuid,
    pub member_email: String,
    pub card_type: String,
    pub trial: bool,
    pub total_sessions: u32,
    pub sessions_used: u32,
    pub purchased_date: NaiveDate,
    pub expiry_date: Option<NaiveDate>,
    pub status: CardStatus,
    pub notes: String,
}

// ============================================================================
// Business Events (one-off guest booking surface)
// ============================================================================

/// Groups multiple business events under one shareable access token
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub contact_email: String,
    pub token: String,
    /// Whether one guest may book more than one of this company's events
    pub allow_multiple_bookings: bool,
    pub active: bool,
}

/// A single non-recurring occurrence with its own capacity pool
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BusinessEvent {
    pub id: Uuid,
    pub company_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub event_datetime: DateTime<Utc>,
    pub duration_minutes: u32,
    pub location: String,
    pub max_capacity: u32,
    pub token: String,
    pub active: bool,
}

impl BusinessEvent {
    pub fn is_in_future(&self, now: DateTime<Utc>) -> bool {
        self.event_datetime > now
    }
}

/// Guest-supplied details for a business event booking
#[derive(Clone, Debug, Default)]
pub struct GuestDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub shoe_size: String,
    pub weight_kg: Option<f64>,
    /// Explicit category choice; skips automatic resolution when given
    pub category: Option<String>,
}

/// A guest-identified booking for a business event (no member account
/// required; optionally linked to one afterwards)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BusinessEventBooking {
    pub id: Uuid,
    pub event_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub shoe_size: String,
    pub weight_kg: Option<f64>,
    pub category: Option<String>,
    pub member_email: Option<String>,
    pub booked_at: DateTime<Utc>,
}

impl BusinessEventBooking {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
