use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::require_admin;

use crate::models::{AvailabilityError, GenerateSlotsRequest, SlotDateQuery};
use crate::services::availability::AvailabilityService;

fn map_error(e: AvailabilityError) -> AppError {
    match e {
        AvailabilityError::InvalidInterval => {
            AppError::Validation("Interval must be between 1 minute and 24 hours".to_string())
        },
        AvailabilityError::NothingGenerated => {
            AppError::Validation("No slots generated for the requested time range".to_string())
        },
        AvailabilityError::SlotNotFound => {
            AppError::NotFound("Slot not found".to_string())
        },
        AvailabilityError::SlotBooked => {
            AppError::Conflict("Booked slots cannot be deleted".to_string())
        },
        AvailabilityError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// Generate and persist slots for a date. Admin only.
///
/// An empty generation is an informational outcome, not a failure: the
/// admin gets a 200 with a zero count and a hint, mirroring how the
/// dashboard reports it.
#[axum::debug_handler]
pub async fn generate_slots(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    body: Result<Json<GenerateSlotsRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    // A malformed or incomplete body is a validation failure, not a 422.
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;

    let date = request.date;
    let service = AvailabilityService::new(&state);

    match service.generate_and_persist(request, auth.token()).await {
        Ok(slots) => {
            let generated = slots.len();
            Ok(Json(json!({
                "success": true,
                "generated": generated,
                "slots": slots,
                "message": format!("{} horários gerados para {}.", generated, date.format("%d/%m/%Y"))
            })))
        },
        Err(AvailabilityError::NothingGenerated) => Ok(Json(json!({
            "success": true,
            "generated": 0,
            "slots": [],
            "message": "Nenhum horário gerado. Verifique os horários de início e fim."
        }))),
        Err(e) => Err(map_error(e)),
    }
}

#[axum::debug_handler]
pub async fn list_slots(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<SlotDateQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let service = AvailabilityService::new(&state);
    let slots = service.list_for_date(query.date, auth.token()).await
        .map_err(map_error)?;

    let total = slots.len();
    Ok(Json(json!({
        "date": query.date,
        "slots": slots,
        "total": total
    })))
}

#[axum::debug_handler]
pub async fn delete_slot(
    State(state): State<Arc<AppConfig>>,
    Path(slot_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let service = AvailabilityService::new(&state);
    service.delete_slot(slot_id, auth.token()).await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Horário excluído."
    })))
}

#[axum::debug_handler]
pub async fn delete_unbooked_slots(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<SlotDateQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let service = AvailabilityService::new(&state);
    service.delete_all_unbooked_for_date(query.date, auth.token()).await
        .map_err(map_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Todos horários livres foram excluídos para esta data."
    })))
}
