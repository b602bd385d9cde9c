use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};

use shared_models::Role;
use shared_utils::extractor::{auth_middleware, clinic_context_middleware};
use shared_utils::guard::require_roles;
use shared_utils::state::AppState;

use crate::handlers::*;

const ADMIN_ONLY: &[Role] = &[Role::Admin, Role::SuperAdmin];
const ADMIN_OR_DESK: &[Role] = &[Role::Admin, Role::SuperAdmin, Role::Receptionist];

pub fn create_clinic_router(state: AppState) -> Router {
    let reads = Router::new()
        .route("/staff", get(list_staff))
        .route("/booking-config", get(booking_config))
        .layer(middleware::from_fn(require_roles(ADMIN_OR_DESK)));

    let admin = Router::new()
        .route("/stats", get(stats))
        .route("/activities", get(activities))
        .route("/staff", post(add_staff))
        .route("/staff/{id}", put(update_staff))
        .route("/staff/{id}", delete(remove_staff))
        .route("/booking-config", put(update_booking_config))
        .route("/notifications", get(list_notifications))
        .route("/notifications/{id}/status", patch(update_notification_status))
        .layer(middleware::from_fn(require_roles(ADMIN_ONLY)));

    reads
        .merge(admin)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            clinic_context_middleware,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

pub fn create_forms_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_templates))
        .route("/", post(create_template))
        .route("/{id}", delete(delete_template))
        .layer(middleware::from_fn(require_roles(ADMIN_ONLY)))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            clinic_context_middleware,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

pub fn create_departments_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_departments))
        .route("/", post(create_department))
        .route("/{id}", delete(delete_department))
        .layer(middleware::from_fn(require_roles(ADMIN_ONLY)))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            clinic_context_middleware,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
