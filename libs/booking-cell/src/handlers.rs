use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{AvailableSlotsQuery, BookingError, BookingRequest};
use crate::services::booking::BookingService;

fn map_error(e: BookingError) -> AppError {
    match e {
        BookingError::Validation(msg) => AppError::Validation(msg),
        BookingError::SlotUnavailable => {
            AppError::Conflict("Este horário não está mais disponível. Por favor, escolha outro horário.".to_string())
        },
        BookingError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// Open slots for a date, for the customer's slot picker.
#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<AvailableSlotsQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(_user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let service = BookingService::new(&state);
    let slots = service.fetch_available(query.date, auth.token()).await
        .map_err(map_error)?;

    let total = slots.len();
    Ok(Json(json!({
        "date": query.date,
        "slots": slots,
        "total": total
    })))
}

/// Submit a booking. The authenticated user owns the appointment; the
/// contact fields in the body are snapshotted as entered.
#[axum::debug_handler]
pub async fn submit_booking(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    body: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    // A malformed or incomplete body is a validation failure, not a 422.
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    let service = BookingService::new(&state);
    let confirmation = service.submit(&user, request, auth.token()).await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": confirmation.appointment,
        "notification": confirmation.notification,
        "admin_notified": confirmation.admin_notified
    })))
}
