use axum::{
    middleware,
    routing::{get, post},
    Extension, Router,
};

use shared_models::{OrderType, Role};
use shared_utils::extractor::{auth_middleware, clinic_context_middleware};
use shared_utils::guard::{require_module, require_roles};
use shared_utils::state::AppState;

use crate::handlers::*;

const DIAGNOSTICS_ROLES: &[Role] = &[Role::Receptionist, Role::Admin, Role::SuperAdmin];

pub fn create_lab_router(state: AppState) -> Router {
    diagnostics_router(state, OrderType::Lab, "lab")
}

pub fn create_radiology_router(state: AppState) -> Router {
    diagnostics_router(state, OrderType::Radiology, "radiology")
}

fn diagnostics_router(state: AppState, order_type: OrderType, module: &'static str) -> Router {
    Router::new()
        .route("/orders", get(queue))
        .route("/orders/{id}/complete", post(complete_order))
        .route("/orders/{id}/reject", post(reject_order))
        .route("/stats", get(stats))
        .layer(Extension(order_type))
        .layer(middleware::from_fn(require_roles(DIAGNOSTICS_ROLES)))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_module(module),
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            clinic_context_middleware,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
