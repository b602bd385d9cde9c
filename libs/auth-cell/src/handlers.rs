use axum::{
    extract::{Extension, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};

use shared_models::{AppError, AuthUser};
use shared_utils::state::AppState;

use crate::models::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, ResetPasswordRequest,
    SelectClinicRequest,
};
use crate::services::AuthService;

fn client_meta(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or(v).trim().to_string());
    let device = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    (ip, device)
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let (ip, device) = client_meta(&headers);
    let response = AuthService::new(&state)
        .login(
            &request.email,
            &request.password,
            request.captcha.as_deref(),
            ip,
            device,
        )
        .await?;

    Ok(Json(json!({ "success": true, "data": response })))
}

#[axum::debug_handler]
pub async fn my_clinics(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let clinics = AuthService::new(&state).my_clinics(&user).await?;
    Ok(Json(json!({ "success": true, "data": clinics })))
}

#[axum::debug_handler]
pub async fn select_clinic(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<SelectClinicRequest>,
) -> Result<Json<Value>, AppError> {
    let response = AuthService::new(&state)
        .select_clinic(&user, request.clinic_id)
        .await?;
    Ok(Json(json!({ "success": true, "data": response })))
}

#[axum::debug_handler]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    AuthService::new(&state)
        .change_password(&user, &request.current_password, &request.new_password)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Password updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn refresh_token(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    let token = AuthService::new(&state).refresh_token(&user).await?;
    Ok(Json(json!({ "success": true, "data": { "token": token } })))
}

#[axum::debug_handler]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let message = AuthService::new(&state)
        .forgot_password(&request.email)
        .await?;
    Ok(Json(json!({ "success": true, "message": message })))
}

#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    AuthService::new(&state)
        .reset_password(request.token, &request.new_password)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Password has been reset"
    })))
}
