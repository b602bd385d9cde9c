use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::{AppError, AuthUser, ClinicContext, OrderType};
use shared_utils::state::AppState;

use crate::models::CompleteOrderRequest;
use crate::services::DiagnosticsService;

#[axum::debug_handler]
pub async fn queue(
    State(state): State<AppState>,
    Extension(order_type): Extension<OrderType>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let orders = DiagnosticsService::new(&state, order_type)
        .queue(context.require()?)
        .await?;
    Ok(Json(json!({ "success": true, "data": orders })))
}

#[axum::debug_handler]
pub async fn stats(
    State(state): State<AppState>,
    Extension(order_type): Extension<OrderType>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let stats = DiagnosticsService::new(&state, order_type)
        .stats(context.require()?)
        .await?;
    Ok(Json(json!({ "success": true, "data": stats })))
}

#[axum::debug_handler]
pub async fn complete_order(
    State(state): State<AppState>,
    Extension(order_type): Extension<OrderType>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
    Path(order_id): Path<i64>,
    Json(request): Json<CompleteOrderRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = DiagnosticsService::new(&state, order_type)
        .complete_order(&user, context.require()?, order_id, request)
        .await?;
    Ok(Json(json!({ "success": true, "data": outcome })))
}

#[axum::debug_handler]
pub async fn reject_order(
    State(state): State<AppState>,
    Extension(order_type): Extension<OrderType>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
    Path(order_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let order = DiagnosticsService::new(&state, order_type)
        .reject_order(&user, context.require()?, order_id)
        .await?;
    Ok(Json(json!({ "success": true, "data": order })))
}
