use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::{AppError, AuthUser};
use shared_utils::state::AppState;

use crate::models::PortalBookingRequest;
use crate::services::PortalService;

#[axum::debug_handler]
pub async fn my_appointments(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let appointments = PortalService::new(&state).my_appointments(&user).await?;
    Ok(Json(json!({ "success": true, "data": appointments })))
}

#[axum::debug_handler]
pub async fn my_records(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let records = PortalService::new(&state).my_records(&user).await?;
    Ok(Json(json!({ "success": true, "data": records })))
}

#[axum::debug_handler]
pub async fn my_invoices(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let invoices = PortalService::new(&state).my_invoices(&user).await?;
    Ok(Json(json!({ "success": true, "data": invoices })))
}

#[axum::debug_handler]
pub async fn clinic_doctors(
    State(state): State<AppState>,
    Path(clinic_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let doctors = PortalService::new(&state).doctors(clinic_id).await?;
    Ok(Json(json!({ "success": true, "data": doctors })))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<PortalBookingRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = PortalService::new(&state).book(&user, request).await?;
    Ok(Json(json!({ "success": true, "data": appointment })))
}
