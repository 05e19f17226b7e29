use axum::{
    extract::{Path, Query, State, Extension},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::{require_admin, JsonBody};

use crate::models::{
    AdminListQuery, AppointmentFilter, AvailabilityQuery, AvailabilityResponse,
    BookAppointmentRequest,
};
use crate::state::AppointmentState;

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<AppointmentState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    let available_slots = state.availability().get_availability(query).await?;
    Ok(Json(AvailabilityResponse { available_slots }))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    JsonBody(request): JsonBody<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = state.booking().book(request, &user).await?;
    Ok((StatusCode::CREATED, Json(json!(appointment))))
}

#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    debug!("Listing appointments for user {}", user.id);

    let appointments = state.listing().list_mine(&user).await?;
    Ok(Json(json!(appointments)))
}

#[axum::debug_handler]
pub async fn list_all_appointments(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let filter = AppointmentFilter::try_from(query)?;
    let appointments = state.listing().list_admin(filter).await?;
    Ok(Json(json!(appointments)))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<AppointmentState>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment = state.booking().cancel(&appointment_id, &user).await?;
    Ok(Json(json!(appointment)))
}
