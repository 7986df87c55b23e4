use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use shared_database::slot_store::{AppointmentRecord, AvailabilitySlot};

/// Status written for every new appointment; there is no cancellation
/// or reschedule path in this flow.
pub const STATUS_CONFIRMED: &str = "confirmado";

/// Customer booking submission. Contact fields are snapshotted into the
/// appointment; later profile edits do not touch existing bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub service_name: String,
    pub appointment_date: NaiveDate,
    pub slot_id: Uuid,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailableSlotsQuery {
    pub date: NaiveDate,
}

/// The customer-facing confirmation the UI shows after a booking; the
/// server returns it as a value instead of pushing a toast side-channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerNotification {
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfirmation {
    pub appointment: AppointmentRecord,
    pub notification: CustomerNotification,
    /// False when the fire-and-forget admin notification insert failed;
    /// the booking itself still succeeded.
    pub admin_notified: bool,
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Slot no longer available")]
    SlotUnavailable,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
