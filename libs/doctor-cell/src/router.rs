use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_models::Role;
use shared_utils::extractor::{auth_middleware, clinic_context_middleware};
use shared_utils::guard::require_roles;
use shared_utils::state::AppState;

use crate::handlers::*;

pub fn create_doctor_router(state: AppState) -> Router {
    Router::new()
        .route("/queue", get(queue))
        .route("/stats", get(stats))
        .route("/activities", get(activities))
        .route("/revenue", get(revenue))
        .route("/templates", get(templates))
        .route("/patients", get(assigned_patients))
        .route("/patients/{id}/history", get(patient_history))
        .route("/orders", get(orders))
        .route("/assessments", post(save_assessment))
        .layer(middleware::from_fn(require_roles(&[Role::Doctor])))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            clinic_context_middleware,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
