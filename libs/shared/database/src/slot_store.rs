use anyhow::Result;
use chrono::{NaiveDate, NaiveTime, Utc};
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::supabase::SupabaseClient;

/// A persisted availability slot (`admin_availability` row).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub id: Uuid,
    pub available_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_booked: bool,
}

/// A generated slot candidate, not yet persisted and without an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSlot {
    pub available_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_booked: bool,
}

/// An appointment to insert (`appointments` row, ids assigned by the store).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: String,
    pub service_name: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub availability_slot_id: Uuid,
    pub message: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub user_phone: String,
    pub service_name: String,
    pub appointment_date: NaiveDate,
    pub appointment_time: NaiveTime,
    pub availability_slot_id: Uuid,
    pub message: Option<String>,
    pub status: String,
}

/// Admin-facing notification row, written once per successful booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAdminNotification {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub link_to: String,
}

/// Typed adapter over the Supabase tables backing the booking flow.
///
/// The store is the only shared mutable state between the admin
/// availability view and the customer booking view; every operation
/// here is a single round-trip.
pub struct SlotStore {
    supabase: SupabaseClient,
}

impl SlotStore {
    pub fn new(supabase: SupabaseClient) -> Self {
        Self { supabase }
    }

    fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    /// Persist a batch of generated slots as one insert statement.
    /// Supabase applies the whole array atomically, so a failed batch
    /// leaves no partial rows behind.
    pub async fn insert_slots(
        &self,
        slots: &[NewSlot],
        auth_token: &str,
    ) -> Result<Vec<AvailabilitySlot>> {
        debug!("Inserting {} availability slots", slots.len());

        let created: Vec<AvailabilitySlot> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/admin_availability",
            Some(auth_token),
            Some(json!(slots)),
            Some(Self::representation_headers()),
        ).await?;

        Ok(created)
    }

    /// All slots for a date, optionally filtered by booked state,
    /// ordered by start time ascending.
    pub async fn query_slots(
        &self,
        date: NaiveDate,
        booked: Option<bool>,
        auth_token: &str,
    ) -> Result<Vec<AvailabilitySlot>> {
        let mut path = format!(
            "/rest/v1/admin_availability?available_date=eq.{}",
            date.format("%Y-%m-%d")
        );
        if let Some(booked) = booked {
            path.push_str(&format!("&is_booked=eq.{}", booked));
        }
        path.push_str("&order=start_time.asc");

        let slots: Vec<AvailabilitySlot> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(slots)
    }

    pub async fn get_slot(
        &self,
        slot_id: Uuid,
        auth_token: &str,
    ) -> Result<Option<AvailabilitySlot>> {
        let path = format!("/rest/v1/admin_availability?id=eq.{}", slot_id);
        let mut result: Vec<AvailabilitySlot> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(result.pop())
    }

    /// Conditionally delete a slot that is still unbooked. The filter
    /// makes abandoning the delete atomic with a racing booking: once
    /// `is_booked` flips the delete matches zero rows and this returns
    /// `Ok(false)`, leaving the appointment's slot intact.
    pub async fn delete_slot(&self, slot_id: Uuid, auth_token: &str) -> Result<bool> {
        debug!("Deleting availability slot {}", slot_id);

        let path = format!(
            "/rest/v1/admin_availability?id=eq.{}&is_booked=eq.false",
            slot_id
        );

        let deleted: Vec<AvailabilitySlot> = self.supabase.request_with_headers(
            Method::DELETE,
            &path,
            Some(auth_token),
            None,
            Some(Self::representation_headers()),
        ).await?;

        Ok(!deleted.is_empty())
    }

    /// Bulk-delete every unbooked slot for a date. Booked slots never
    /// match the filter and are left untouched.
    pub async fn delete_unbooked_slots(
        &self,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<()> {
        debug!("Deleting unbooked slots for {}", date);

        let path = format!(
            "/rest/v1/admin_availability?available_date=eq.{}&is_booked=eq.false",
            date.format("%Y-%m-%d")
        );
        self.supabase.execute(Method::DELETE, &path, Some(auth_token), None).await
    }

    /// Conditionally mark a slot booked. The `is_booked=eq.false` filter
    /// makes this a compare-and-set at the store: when a racing booking
    /// already flipped the flag the update matches zero rows and this
    /// returns `Ok(false)`.
    pub async fn book_slot(&self, slot_id: Uuid, auth_token: &str) -> Result<bool> {
        let path = format!(
            "/rest/v1/admin_availability?id=eq.{}&is_booked=eq.false",
            slot_id
        );

        let updated: Vec<AvailabilitySlot> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!({ "is_booked": true })),
            Some(Self::representation_headers()),
        ).await?;

        Ok(!updated.is_empty())
    }

    /// Best-effort rollback of a booking mark when the appointment
    /// insert fails after the slot was already claimed.
    pub async fn release_slot(&self, slot_id: Uuid, auth_token: &str) -> Result<()> {
        debug!("Releasing availability slot {}", slot_id);

        let path = format!("/rest/v1/admin_availability?id=eq.{}", slot_id);
        self.supabase.execute(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!({ "is_booked": false })),
        ).await
    }

    pub async fn insert_appointment(
        &self,
        appointment: &NewAppointment,
        auth_token: &str,
    ) -> Result<AppointmentRecord> {
        debug!("Inserting appointment for slot {}", appointment.availability_slot_id);

        let mut body = serde_json::to_value(appointment)?;
        if let Value::Object(map) = &mut body {
            map.insert("created_at".to_string(), json!(Utc::now().to_rfc3339()));
        }

        let mut created: Vec<AppointmentRecord> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some(auth_token),
            Some(body),
            Some(Self::representation_headers()),
        ).await?;

        created.pop().ok_or_else(|| anyhow::anyhow!("Failed to create appointment"))
    }

    /// Fire-and-forget from the booking flow's perspective; callers log
    /// failures instead of propagating them.
    pub async fn insert_admin_notification(
        &self,
        notification: &NewAdminNotification,
        auth_token: &str,
    ) -> Result<()> {
        self.supabase.execute(
            Method::POST,
            "/rest/v1/admin_notifications",
            Some(auth_token),
            Some(serde_json::to_value(notification)?),
        ).await
    }
}
