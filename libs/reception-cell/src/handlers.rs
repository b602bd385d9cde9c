use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::{AppError, AuthUser, ClinicContext};
use shared_utils::state::AppState;

use crate::models::{
    BookingStatusRequest, BookingsQuery, CreateBookingRequest, PatientSearchQuery,
    RegisterPatientRequest,
};
use crate::services::ReceptionService;

#[axum::debug_handler]
pub async fn stats(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let stats = ReceptionService::new(&state)
        .stats(context.require()?)
        .await?;
    Ok(Json(json!({ "success": true, "data": stats })))
}

#[axum::debug_handler]
pub async fn activities(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let entries = ReceptionService::new(&state)
        .activities(context.require()?)
        .await?;
    Ok(Json(json!({ "success": true, "data": entries })))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
    Query(query): Query<PatientSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let patients = ReceptionService::new(&state)
        .patients(context.require()?, query.search.as_deref())
        .await?;
    Ok(Json(json!({ "success": true, "data": patients })))
}

#[axum::debug_handler]
pub async fn register_patient(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = ReceptionService::new(&state)
        .register_patient(&user, context.require()?, request)
        .await?;
    Ok(Json(json!({ "success": true, "data": outcome })))
}

#[axum::debug_handler]
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Value>, AppError> {
    let bookings = ReceptionService::new(&state)
        .bookings(context.require()?, query.date)
        .await?;
    Ok(Json(json!({ "success": true, "data": bookings })))
}

#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = ReceptionService::new(&state)
        .create_booking(&user, context.require()?, request)
        .await?;
    Ok(Json(json!({ "success": true, "data": outcome })))
}

#[axum::debug_handler]
pub async fn update_booking_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
    Path(appointment_id): Path<i64>,
    Json(request): Json<BookingStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = ReceptionService::new(&state)
        .update_booking_status(&user, context.require()?, appointment_id, &request.status)
        .await?;
    Ok(Json(json!({ "success": true, "data": appointment })))
}
