use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::{AppError, AuthUser};
use shared_utils::state::AppState;

use crate::models::{
    AuditSearchQuery, CreateClinicRequest, ImpersonateClinicRequest, ImpersonateUserRequest,
    ProvisionAdminRequest, UpdateClinicRequest, UpdateModulesRequest, UpdateStaffRequest,
};
use crate::services::{ImpersonationService, SuperAdminService};

#[axum::debug_handler]
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let stats = SuperAdminService::new(&state).dashboard().await?;
    Ok(Json(json!({ "success": true, "data": stats })))
}

#[axum::debug_handler]
pub async fn alerts(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let alerts = SuperAdminService::new(&state).alerts().await?;
    Ok(Json(json!({ "success": true, "data": alerts })))
}

#[axum::debug_handler]
pub async fn list_clinics(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let clinics = SuperAdminService::new(&state).list_clinics().await?;
    Ok(Json(json!({ "success": true, "data": clinics })))
}

#[axum::debug_handler]
pub async fn create_clinic(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<CreateClinicRequest>,
) -> Result<Json<Value>, AppError> {
    let clinic = SuperAdminService::new(&state)
        .create_clinic(&user, request)
        .await?;
    Ok(Json(json!({ "success": true, "data": clinic })))
}

#[axum::debug_handler]
pub async fn update_clinic(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(clinic_id): Path<i64>,
    Json(request): Json<UpdateClinicRequest>,
) -> Result<Json<Value>, AppError> {
    let clinic = SuperAdminService::new(&state)
        .update_clinic(&user, clinic_id, request)
        .await?;
    Ok(Json(json!({ "success": true, "data": clinic })))
}

#[axum::debug_handler]
pub async fn toggle_clinic_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(clinic_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let clinic = SuperAdminService::new(&state)
        .toggle_clinic_status(&user, clinic_id)
        .await?;
    Ok(Json(json!({ "success": true, "data": clinic })))
}

#[axum::debug_handler]
pub async fn update_modules(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(clinic_id): Path<i64>,
    Json(request): Json<UpdateModulesRequest>,
) -> Result<Json<Value>, AppError> {
    let clinic = SuperAdminService::new(&state)
        .update_modules(&user, clinic_id, request.modules)
        .await?;
    Ok(Json(json!({ "success": true, "data": clinic })))
}

#[axum::debug_handler]
pub async fn delete_clinic(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(clinic_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    SuperAdminService::new(&state)
        .delete_clinic(&user, clinic_id)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Clinic deleted" })))
}

#[axum::debug_handler]
pub async fn provision_admin(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(clinic_id): Path<i64>,
    Json(request): Json<ProvisionAdminRequest>,
) -> Result<Json<Value>, AppError> {
    let row = SuperAdminService::new(&state)
        .provision_admin(&user, clinic_id, request)
        .await?;
    Ok(Json(json!({ "success": true, "data": row })))
}

#[axum::debug_handler]
pub async fn global_staff(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let rows = SuperAdminService::new(&state).global_staff().await?;
    Ok(Json(json!({ "success": true, "data": rows })))
}

#[axum::debug_handler]
pub async fn update_staff(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(staff_id): Path<i64>,
    Json(request): Json<UpdateStaffRequest>,
) -> Result<Json<Value>, AppError> {
    SuperAdminService::new(&state)
        .update_staff(&user, staff_id, request)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Staff updated" })))
}

#[axum::debug_handler]
pub async fn toggle_staff_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(staff_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let status = SuperAdminService::new(&state)
        .toggle_staff_status(&user, staff_id)
        .await?;
    Ok(Json(json!({ "success": true, "data": { "status": status } })))
}

#[axum::debug_handler]
pub async fn delete_staff(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(staff_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    SuperAdminService::new(&state)
        .delete_staff(&user, staff_id)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Staff removed" })))
}

#[axum::debug_handler]
pub async fn search_audit(
    State(state): State<AppState>,
    Query(query): Query<AuditSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let (entries, total) = SuperAdminService::new(&state).search_audit(query).await?;
    Ok(Json(json!({
        "success": true,
        "data": { "entries": entries, "total": total }
    })))
}

#[axum::debug_handler]
pub async fn settings(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let settings = SuperAdminService::new(&state).settings();
    Ok(Json(json!({ "success": true, "data": settings })))
}

#[axum::debug_handler]
pub async fn storage_stats(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let stats = SuperAdminService::new(&state).storage_stats().await?;
    Ok(Json(json!({ "success": true, "data": stats })))
}

#[axum::debug_handler]
pub async fn trigger_backup(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let result = SuperAdminService::new(&state).trigger_backup(&user).await?;
    Ok(Json(json!({ "success": true, "data": result })))
}

#[axum::debug_handler]
pub async fn impersonate_user(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<ImpersonateUserRequest>,
) -> Result<Json<Value>, AppError> {
    let grant = ImpersonationService::new(&state)
        .impersonate_user(&user, request.user_id)
        .await?;
    Ok(Json(json!({ "success": true, "data": grant })))
}

#[axum::debug_handler]
pub async fn impersonate_clinic(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<ImpersonateClinicRequest>,
) -> Result<Json<Value>, AppError> {
    let grant = ImpersonationService::new(&state)
        .impersonate_clinic(&user, request.clinic_id)
        .await?;
    Ok(Json(json!({ "success": true, "data": grant })))
}
