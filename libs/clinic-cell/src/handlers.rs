use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::{AppError, AuthUser, BookingConfig, ClinicContext};
use shared_utils::state::AppState;

use crate::models::{
    AddStaffRequest, CreateDepartmentRequest, CreateTemplateRequest, NotificationStatusRequest,
    UpdateStaffRequest,
};
use crate::services::ClinicService;

#[axum::debug_handler]
pub async fn stats(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let stats = ClinicService::new(&state).stats(context.require()?).await?;
    Ok(Json(json!({ "success": true, "data": stats })))
}

#[axum::debug_handler]
pub async fn activities(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let entries = ClinicService::new(&state)
        .activities(context.require()?)
        .await?;
    Ok(Json(json!({ "success": true, "data": entries })))
}

#[axum::debug_handler]
pub async fn list_staff(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let staff = ClinicService::new(&state).staff(context.require()?).await?;
    Ok(Json(json!({ "success": true, "data": staff })))
}

#[axum::debug_handler]
pub async fn add_staff(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
    Json(request): Json<AddStaffRequest>,
) -> Result<Json<Value>, AppError> {
    let staff = ClinicService::new(&state)
        .add_staff(&user, context.require()?, request)
        .await?;
    Ok(Json(json!({ "success": true, "data": staff })))
}

#[axum::debug_handler]
pub async fn update_staff(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
    Path(staff_id): Path<i64>,
    Json(request): Json<UpdateStaffRequest>,
) -> Result<Json<Value>, AppError> {
    ClinicService::new(&state)
        .update_staff(&user, context.require()?, staff_id, request)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Staff updated" })))
}

#[axum::debug_handler]
pub async fn remove_staff(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
    Path(staff_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    ClinicService::new(&state)
        .remove_staff(&user, context.require()?, staff_id)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Staff removed" })))
}

#[axum::debug_handler]
pub async fn booking_config(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let config = ClinicService::new(&state)
        .booking_config(context.require()?)
        .await?;
    Ok(Json(json!({ "success": true, "data": config })))
}

#[axum::debug_handler]
pub async fn update_booking_config(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
    Json(config): Json<BookingConfig>,
) -> Result<Json<Value>, AppError> {
    let config = ClinicService::new(&state)
        .update_booking_config(&user, context.require()?, config)
        .await?;
    Ok(Json(json!({ "success": true, "data": config })))
}

#[axum::debug_handler]
pub async fn list_templates(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let templates = ClinicService::new(&state)
        .templates(context.require()?)
        .await?;
    Ok(Json(json!({ "success": true, "data": templates })))
}

#[axum::debug_handler]
pub async fn create_template(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
    Json(request): Json<CreateTemplateRequest>,
) -> Result<Json<Value>, AppError> {
    let template = ClinicService::new(&state)
        .create_template(&user, context.require()?, request)
        .await?;
    Ok(Json(json!({ "success": true, "data": template })))
}

#[axum::debug_handler]
pub async fn delete_template(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
    Path(template_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    ClinicService::new(&state)
        .delete_template(&user, context.require()?, template_id)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Template deleted" })))
}

#[axum::debug_handler]
pub async fn list_departments(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let departments = ClinicService::new(&state)
        .departments(context.require()?)
        .await?;
    Ok(Json(json!({ "success": true, "data": departments })))
}

#[axum::debug_handler]
pub async fn create_department(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
    Json(request): Json<CreateDepartmentRequest>,
) -> Result<Json<Value>, AppError> {
    let department = ClinicService::new(&state)
        .create_department(context.require()?, request)
        .await?;
    Ok(Json(json!({ "success": true, "data": department })))
}

#[axum::debug_handler]
pub async fn delete_department(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
    Path(department_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    ClinicService::new(&state)
        .delete_department(context.require()?, department_id)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Department deleted" })))
}

#[axum::debug_handler]
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let notifications = ClinicService::new(&state)
        .notifications(context.require()?)
        .await?;
    Ok(Json(json!({ "success": true, "data": notifications })))
}

#[axum::debug_handler]
pub async fn update_notification_status(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
    Path(notification_id): Path<i64>,
    Json(request): Json<NotificationStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let notification = ClinicService::new(&state)
        .update_notification_status(context.require()?, notification_id, &request.status)
        .await?;
    Ok(Json(json!({ "success": true, "data": notification })))
}
