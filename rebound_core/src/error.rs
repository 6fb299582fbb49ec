//! Error types for the rebound_core library.

use chrono::{DateTime, Utc};
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for rebound_core operations.
///
/// Domain outcomes (window gating, capacity, ledger state) are ordinary
/// variants returned to the caller; only storage/IO failures are treated
/// as fatal for the current request. The engine performs no retries.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catalog validation error
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Storage layer error
    #[error("Store error: {0}")]
    Store(String),

    /// Entity lookup failed
    #[error("Not found: {0}")]
    NotFound(String),

    /// Member profile is missing shoe size or weight and has no override
    #[error("Incomplete profile: {0}")]
    IncompleteProfile(String),

    /// Member attributes resolve to no configured equipment category
    #[error("No matching equipment category: {0}")]
    NoMatchingCategory(String),

    /// Booking window has not opened yet for this occurrence
    #[error("Booking window opens at {opens_at}")]
    WindowNotOpenYet { opens_at: DateTime<Utc> },

    /// Booking window has already closed (or the occurrence has passed)
    #[error("Booking window has closed")]
    WindowClosed,

    /// No equipment or seats remain for the requested occurrence
    #[error("No capacity remaining for this session")]
    CapacityExhausted,

    /// An identical booking already exists
    #[error("Already booked for this session")]
    DuplicateBooking,

    /// Card cannot be debited in its current state
    #[error("Invalid card state: {0}")]
    InvalidCardState(String),

    /// Cancellation attempted after the occurrence has passed
    #[error("Session has already taken place")]
    PastOccurrence,

    /// Charge attempted before the occurrence has taken place
    #[error("Session has not taken place yet")]
    FutureOccurrence,

    /// Schedule or event is not active
    #[error("Schedule is not active")]
    InactiveSchedule,

    /// Requested date-time is not an occurrence of the schedule
    #[error("Not a valid occurrence of this schedule")]
    InvalidOccurrence,
}
