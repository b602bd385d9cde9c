use axum::{
    middleware,
    routing::{get, patch},
    Router,
};

use shared_models::Role;
use shared_utils::extractor::{auth_middleware, clinic_context_middleware};
use shared_utils::guard::{require_module, require_roles};
use shared_utils::state::AppState;

use crate::handlers::*;

const BILLING_ROLES: &[Role] = &[Role::Receptionist, Role::Admin, Role::SuperAdmin];

pub fn create_billing_router(state: AppState) -> Router {
    Router::new()
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route("/invoices/{id}/status", patch(update_invoice_status))
        .route("/stats", get(stats))
        .layer(middleware::from_fn(require_roles(BILLING_ROLES)))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_module("billing"),
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            clinic_context_middleware,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
