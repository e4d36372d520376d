// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{AvailabilityQuery, BookAppointmentRequest, SchedulingError, SetStatusRequest};
use crate::services::availability::AvailabilityService;
use crate::services::booking::BookingService;

fn into_app_error(err: SchedulingError) -> AppError {
    match err {
        SchedulingError::InvalidDate(_)
        | SchedulingError::InvalidWeekday(_)
        | SchedulingError::InvalidIdentifier { .. }
        | SchedulingError::UnknownStatus(_)
        | SchedulingError::InvalidStatusTransition { .. } => {
            AppError::ValidationError(err.to_string())
        }
        SchedulingError::NotFound(_) => AppError::NotFound(err.to_string()),
        SchedulingError::SlotTaken { existing } => AppError::Conflict {
            message: "Slot is already booked".to_string(),
            conflicting: Some(json!(existing)),
        },
        SchedulingError::Database(msg) => AppError::Database(msg),
        SchedulingError::Upstream(msg) => AppError::ExternalService(msg),
    }
}

/// Open slots for one provider on one date.
#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<AvailabilityQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let availability_service = AvailabilityService::new(&state);

    let slots = availability_service
        .get_availability(query, token)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "slots": slots,
        "total": slots.len(),
    })))
}

/// Book a concrete slot and issue the day's next waiting-room token.
#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let confirmation = booking_service
        .book_appointment(request, token)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": confirmation.appointment,
        "token_number": confirmation.token_number,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .get_appointment(&appointment_id, token)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn set_appointment_status(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<String>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Json(request): Json<SetStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let token = auth.token();
    let booking_service = BookingService::new(&state);

    let appointment = booking_service
        .set_status(&appointment_id, &request.status, token)
        .await
        .map_err(into_app_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment status updated"
    })))
}
