use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::slot_store::{AvailabilitySlot, SlotStore};
use shared_database::supabase::SupabaseClient;

use crate::models::{AvailabilityError, GenerateSlotsRequest};
use crate::services::generator::generate_slots;

/// Longest accepted slot interval. A slot never spans more than a day.
const MAX_INTERVAL_MINUTES: i64 = 24 * 60;

/// Administrator-facing slot management: generate, list, delete.
pub struct AvailabilityService {
    store: SlotStore,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: SlotStore::new(SupabaseClient::new(config)),
        }
    }

    /// Generate candidate slots and persist them as one batch insert.
    /// An empty generation (start >= end) is reported as
    /// `NothingGenerated` so the caller can show an informational
    /// outcome instead of writing nothing silently.
    pub async fn generate_and_persist(
        &self,
        request: GenerateSlotsRequest,
        auth_token: &str,
    ) -> Result<Vec<AvailabilitySlot>, AvailabilityError> {
        if request.interval_minutes <= 0 || request.interval_minutes > MAX_INTERVAL_MINUTES {
            return Err(AvailabilityError::InvalidInterval);
        }

        let candidates = generate_slots(
            request.date,
            request.start_time,
            request.end_time,
            request.interval_minutes,
        );

        if candidates.is_empty() {
            debug!("No slots generated for {} ({} - {})",
                   request.date, request.start_time, request.end_time);
            return Err(AvailabilityError::NothingGenerated);
        }

        let created = self.store
            .insert_slots(&candidates, auth_token)
            .await
            .map_err(|e| AvailabilityError::DatabaseError(e.to_string()))?;

        info!("Generated {} slots for {}", created.len(), request.date);
        Ok(created)
    }

    /// All slots for a date, booked or not, ordered by start time.
    pub async fn list_for_date(
        &self,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<AvailabilitySlot>, AvailabilityError> {
        self.store
            .query_slots(date, None, auth_token)
            .await
            .map_err(|e| AvailabilityError::DatabaseError(e.to_string()))
    }

    /// Delete a single slot. Booked slots are never deletable through
    /// this path: the pre-read distinguishes missing from booked, and
    /// the delete itself is conditional on `is_booked = false`, so a
    /// booking that lands between the two still keeps its slot.
    pub async fn delete_slot(
        &self,
        slot_id: Uuid,
        auth_token: &str,
    ) -> Result<(), AvailabilityError> {
        let slot = self.store
            .get_slot(slot_id, auth_token)
            .await
            .map_err(|e| AvailabilityError::DatabaseError(e.to_string()))?
            .ok_or(AvailabilityError::SlotNotFound)?;

        if slot.is_booked {
            return Err(AvailabilityError::SlotBooked);
        }

        let deleted = self.store
            .delete_slot(slot_id, auth_token)
            .await
            .map_err(|e| AvailabilityError::DatabaseError(e.to_string()))?;

        if !deleted {
            return Err(AvailabilityError::SlotBooked);
        }

        info!("Deleted slot {} on {}", slot_id, slot.available_date);
        Ok(())
    }

    /// Bulk-delete the unbooked slots for a date; booked slots stay.
    pub async fn delete_all_unbooked_for_date(
        &self,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<(), AvailabilityError> {
        self.store
            .delete_unbooked_slots(date, auth_token)
            .await
            .map_err(|e| AvailabilityError::DatabaseError(e.to_string()))?;

        info!("Deleted unbooked slots for {}", date);
        Ok(())
    }
}
