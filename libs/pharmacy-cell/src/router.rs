use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_models::Role;
use shared_utils::extractor::{auth_middleware, clinic_context_middleware};
use shared_utils::guard::{require_module, require_roles};
use shared_utils::state::AppState;

use crate::handlers::*;

const PHARMACY_ROLES: &[Role] = &[Role::Receptionist, Role::Admin, Role::SuperAdmin];

pub fn create_pharmacy_router(state: AppState) -> Router {
    Router::new()
        .route("/inventory", get(list_inventory).post(add_inventory_item))
        .route("/inventory/{id}", patch(update_inventory_item))
        .route("/orders", get(order_queue))
        .route("/orders/{id}/process", post(process_order))
        .route("/sales", post(direct_sale))
        .layer(middleware::from_fn(require_roles(PHARMACY_ROLES)))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_module("pharmacy"),
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            clinic_context_middleware,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
