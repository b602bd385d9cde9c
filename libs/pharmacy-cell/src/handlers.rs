use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::{AppError, AuthUser, ClinicContext};
use shared_utils::state::AppState;

use crate::models::{
    AddInventoryRequest, DirectSaleRequest, ProcessOrderRequest, UpdateInventoryRequest,
};
use crate::services::PharmacyService;

#[axum::debug_handler]
pub async fn list_inventory(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let items = PharmacyService::new(&state)
        .inventory(context.require()?)
        .await?;
    Ok(Json(json!({ "success": true, "data": items })))
}

#[axum::debug_handler]
pub async fn add_inventory_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
    Json(request): Json<AddInventoryRequest>,
) -> Result<Json<Value>, AppError> {
    let item = PharmacyService::new(&state)
        .add_item(&user, context.require()?, request)
        .await?;
    Ok(Json(json!({ "success": true, "data": item })))
}

#[axum::debug_handler]
pub async fn update_inventory_item(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
    Path(item_id): Path<i64>,
    Json(request): Json<UpdateInventoryRequest>,
) -> Result<Json<Value>, AppError> {
    let item = PharmacyService::new(&state)
        .update_item(context.require()?, item_id, request)
        .await?;
    Ok(Json(json!({ "success": true, "data": item })))
}

#[axum::debug_handler]
pub async fn order_queue(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let orders = PharmacyService::new(&state)
        .order_queue(context.require()?)
        .await?;
    Ok(Json(json!({ "success": true, "data": orders })))
}

#[axum::debug_handler]
pub async fn process_order(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
    Path(order_id): Path<i64>,
    Json(request): Json<ProcessOrderRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = PharmacyService::new(&state)
        .process_order(&user, context.require()?, order_id, request)
        .await?;
    Ok(Json(json!({ "success": true, "data": outcome })))
}

#[axum::debug_handler]
pub async fn direct_sale(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
    Json(request): Json<DirectSaleRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = PharmacyService::new(&state)
        .direct_sale(&user, context.require()?, request)
        .await?;
    Ok(Json(json!({ "success": true, "data": outcome })))
}
