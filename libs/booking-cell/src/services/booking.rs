use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::slot_store::{
    AvailabilitySlot, NewAdminNotification, NewAppointment, SlotStore,
};
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{
    BookingConfirmation, BookingError, BookingRequest, CustomerNotification, STATUS_CONFIRMED,
};

/// Customer-facing booking flow: list open slots, submit an appointment
/// that consumes exactly one of them.
pub struct BookingService {
    store: SlotStore,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: SlotStore::new(SupabaseClient::new(config)),
        }
    }

    /// Unbooked slots for a date, ordered by start time. Stateless:
    /// every call re-reads the store, so a date change on the client
    /// always reflects current availability.
    pub async fn fetch_available(
        &self,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<AvailabilitySlot>, BookingError> {
        self.store
            .query_slots(date, Some(false), auth_token)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))
    }

    /// Submit a booking against a chosen slot.
    ///
    /// The slot is re-read as a pre-check, then claimed with a
    /// conditional update on `is_booked = false`; whichever submission
    /// flips the flag first wins and the loser gets `SlotUnavailable`.
    /// Only after the claim succeeds is the appointment written, so a
    /// failed submission leaves no partial state.
    pub async fn submit(
        &self,
        user: &User,
        request: BookingRequest,
        auth_token: &str,
    ) -> Result<BookingConfirmation, BookingError> {
        validate_request(&request)?;

        let user_id = Uuid::parse_str(&user.id)
            .map_err(|_| BookingError::Validation("Invalid user id".to_string()))?;

        let slot = self.store
            .get_slot(request.slot_id, auth_token)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?
            .ok_or(BookingError::SlotUnavailable)?;

        if slot.is_booked {
            return Err(BookingError::SlotUnavailable);
        }

        // Selection is bound to the displayed date; a slot carried over
        // from a previous date must not slip through.
        if slot.available_date != request.appointment_date {
            return Err(BookingError::Validation(
                "Selected slot does not belong to the chosen date".to_string(),
            ));
        }

        let claimed = self.store
            .book_slot(slot.id, auth_token)
            .await
            .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if !claimed {
            info!("Lost booking race for slot {}", slot.id);
            return Err(BookingError::SlotUnavailable);
        }

        let appointment = NewAppointment {
            user_id,
            user_name: request.name.trim().to_string(),
            user_email: request.email.trim().to_string(),
            user_phone: normalize_phone(&request.phone),
            service_name: request.service_name.clone(),
            appointment_date: slot.available_date,
            appointment_time: slot.start_time,
            availability_slot_id: slot.id,
            message: request.message.clone(),
            status: STATUS_CONFIRMED.to_string(),
        };

        let created = match self.store.insert_appointment(&appointment, auth_token).await {
            Ok(record) => record,
            Err(e) => {
                // The slot was already claimed; release it so the
                // customer can retry by resubmitting.
                if let Err(release_err) = self.store.release_slot(slot.id, auth_token).await {
                    warn!("Failed to release slot {} after booking failure: {}",
                          slot.id, release_err);
                }
                return Err(BookingError::DatabaseError(e.to_string()));
            }
        };

        let admin_notified = self.notify_admin(&created, auth_token).await;

        info!("Appointment {} booked for slot {} ({})",
              created.id, slot.id, created.service_name);

        let notification = CustomerNotification {
            title: "Consulta Agendada!".to_string(),
            message: format!(
                "Sua consulta de {} foi agendada para {} às {}.",
                created.service_name,
                created.appointment_date.format("%d/%m/%Y"),
                created.appointment_time.format("%H:%M"),
            ),
        };

        Ok(BookingConfirmation {
            appointment: created,
            notification,
            admin_notified,
        })
    }

    /// Fire-and-forget admin notification; a failure here never fails
    /// the booking.
    async fn notify_admin(
        &self,
        appointment: &crate::models::AppointmentRecord,
        auth_token: &str,
    ) -> bool {
        let notification = NewAdminNotification {
            title: "Nova Consulta Agendada!".to_string(),
            message: format!(
                "{} agendou {} para {} às {}.",
                appointment.user_name,
                appointment.service_name,
                appointment.appointment_date.format("%d/%m/%y"),
                appointment.appointment_time.format("%H:%M"),
            ),
            kind: "success".to_string(),
            link_to: "/admin-dashboard".to_string(),
        };

        match self.store.insert_admin_notification(&notification, auth_token).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to insert admin notification for appointment {}: {}",
                      appointment.id, e);
                false
            }
        }
    }
}

fn validate_request(request: &BookingRequest) -> Result<(), BookingError> {
    if request.name.trim().is_empty() {
        return Err(BookingError::Validation("Name is required".to_string()));
    }

    let email = request.email.trim();
    if email.is_empty() {
        return Err(BookingError::Validation("Email is required".to_string()));
    }
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(BookingError::Validation("Invalid email address".to_string()));
    }

    if request.service_name.trim().is_empty() {
        return Err(BookingError::Validation("Service name is required".to_string()));
    }

    Ok(())
}

fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn request() -> BookingRequest {
        BookingRequest {
            name: "Maria Silva".to_string(),
            email: "maria@example.com".to_string(),
            phone: "(11) 99999-0000".to_string(),
            service_name: "Tarot".to_string(),
            appointment_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            slot_id: Uuid::new_v4(),
            message: None,
        }
    }

    #[test]
    fn accepts_complete_request() {
        assert!(validate_request(&request()).is_ok());
    }

    #[test]
    fn rejects_blank_name() {
        let mut req = request();
        req.name = "   ".to_string();
        assert_matches!(validate_request(&req), Err(BookingError::Validation(_)));
    }

    #[test]
    fn rejects_missing_email() {
        let mut req = request();
        req.email = String::new();
        assert_matches!(validate_request(&req), Err(BookingError::Validation(_)));
    }

    #[test]
    fn rejects_email_without_domain() {
        let mut req = request();
        req.email = "maria@".to_string();
        assert_matches!(validate_request(&req), Err(BookingError::Validation(_)));
    }

    #[test]
    fn phone_is_normalized_to_digits() {
        assert_eq!(normalize_phone("(11) 99999-0000"), "11999990000");
        assert_eq!(normalize_phone("+55 11 9.9999.0000"), "5511999990000");
        assert_eq!(normalize_phone(""), "");
    }
}
