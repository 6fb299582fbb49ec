#![forbid(unsafe_code)]

//! Core domain model and business logic for the Rebound booking system.
//!
//! This crate provides:
//! - Domain types (equipment classes, members, schedules, cards, events)
//! - Catalog management and validation
//! - Occurrence expansion and booking window gating
//! - Category resolution and capacity calculation
//! - The booking orchestrator and session card ledger
//! - Persistence (JSON store, CSV roster export)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod schedule;
pub mod resolver;
pub mod capacity;
pub mod ledger;
pub mod store;
pub mod engine;
pub mod events;
pub mod roster;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use schedule::{
    is_booking_open, next_occurrence, upcoming_occurrences, window_state, WindowState,
};
pub use resolver::resolve_category;
pub use capacity::{aggregate_availability, availability_breakdown, category_availability};
pub use ledger::{charge_attendance, charge_past_sessions, ChargeReport};
pub use store::{
    BookingStore, CardStore, Directory, EquipmentInventory, EventStore, MemoryStore,
};
pub use engine::{book_session, cancel_booking, BookingRequest};
pub use events::{available_spots, book_event};
pub use roster::write_roster;
