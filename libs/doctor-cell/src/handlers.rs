use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::{AppError, AuthUser, ClinicContext};
use shared_utils::state::AppState;

use crate::models::SaveAssessmentRequest;
use crate::services::DoctorService;

#[axum::debug_handler]
pub async fn queue(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let queue = DoctorService::new(&state)
        .queue(context.require()?, user.id)
        .await?;
    Ok(Json(json!({ "success": true, "data": queue })))
}

#[axum::debug_handler]
pub async fn stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let stats = DoctorService::new(&state)
        .stats(context.require()?, user.id)
        .await?;
    Ok(Json(json!({ "success": true, "data": stats })))
}

#[axum::debug_handler]
pub async fn activities(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let entries = DoctorService::new(&state)
        .activities(context.require()?)
        .await?;
    Ok(Json(json!({ "success": true, "data": entries })))
}

#[axum::debug_handler]
pub async fn revenue(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let summary = DoctorService::new(&state)
        .revenue(context.require()?, user.id)
        .await?;
    Ok(Json(json!({ "success": true, "data": summary })))
}

#[axum::debug_handler]
pub async fn templates(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let templates = DoctorService::new(&state)
        .templates(context.require()?)
        .await?;
    Ok(Json(json!({ "success": true, "data": templates })))
}

#[axum::debug_handler]
pub async fn assigned_patients(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let patients = DoctorService::new(&state)
        .assigned_patients(context.require()?, user.id)
        .await?;
    Ok(Json(json!({ "success": true, "data": patients })))
}

#[axum::debug_handler]
pub async fn patient_history(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let history = DoctorService::new(&state)
        .patient_history(context.require()?, patient_id)
        .await?;
    Ok(Json(json!({ "success": true, "data": history })))
}

#[axum::debug_handler]
pub async fn orders(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let orders = DoctorService::new(&state)
        .orders(context.require()?, user.id)
        .await?;
    Ok(Json(json!({ "success": true, "data": orders })))
}

#[axum::debug_handler]
pub async fn save_assessment(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
    Json(request): Json<SaveAssessmentRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = DoctorService::new(&state)
        .save_assessment(&user, context.require()?, request)
        .await?;
    Ok(Json(json!({ "success": true, "data": outcome })))
}
