use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_models::{AppError, AuthUser, ClinicContext};
use shared_utils::state::AppState;

use crate::models::{CreateInvoiceRequest, InvoiceStatusRequest};
use crate::services::BillingService;

#[axum::debug_handler]
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let invoices = BillingService::new(&state)
        .invoices(context.require()?)
        .await?;
    Ok(Json(json!({ "success": true, "data": invoices })))
}

#[axum::debug_handler]
pub async fn stats(
    State(state): State<AppState>,
    Extension(context): Extension<ClinicContext>,
) -> Result<Json<Value>, AppError> {
    let stats = BillingService::new(&state).stats(context.require()?).await?;
    Ok(Json(json!({ "success": true, "data": stats })))
}

#[axum::debug_handler]
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<Json<Value>, AppError> {
    let invoice = BillingService::new(&state)
        .create_invoice(&user, context.require()?, request)
        .await?;
    Ok(Json(json!({ "success": true, "data": invoice })))
}

#[axum::debug_handler]
pub async fn update_invoice_status(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Extension(context): Extension<ClinicContext>,
    Path(invoice_id): Path<String>,
    Json(request): Json<InvoiceStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let invoice = BillingService::new(&state)
        .update_status(&user, context.require()?, &invoice_id, request)
        .await?;
    Ok(Json(json!({ "success": true, "data": invoice })))
}
