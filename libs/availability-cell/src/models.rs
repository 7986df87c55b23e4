use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use shared_database::slot_store::{AvailabilitySlot, NewSlot};

/// Admin request to generate slots for a single date.
/// Times use the store's wire format, `HH:MM:SS`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateSlotsRequest {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub interval_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotDateQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Error)]
pub enum AvailabilityError {
    #[error("Interval must be between 1 minute and 24 hours")]
    InvalidInterval,

    #[error("No slots generated for the requested time range")]
    NothingGenerated,

    #[error("Slot not found")]
    SlotNotFound,

    #[error("Slot is booked and cannot be deleted")]
    SlotBooked,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
