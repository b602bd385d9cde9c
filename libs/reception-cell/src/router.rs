use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use shared_models::Role;
use shared_utils::extractor::{auth_middleware, clinic_context_middleware};
use shared_utils::guard::require_roles;
use shared_utils::state::AppState;

use crate::handlers::*;

const DESK: &[Role] = &[Role::Receptionist, Role::Admin, Role::SuperAdmin];
const DESK_OR_DOCTOR: &[Role] = &[
    Role::Receptionist,
    Role::Admin,
    Role::SuperAdmin,
    Role::Doctor,
];

pub fn create_reception_router(state: AppState) -> Router {
    let reads = Router::new()
        .route("/patients", get(list_patients))
        .route("/bookings", get(list_bookings))
        .layer(middleware::from_fn(require_roles(DESK_OR_DOCTOR)));

    let writes = Router::new()
        .route("/stats", get(stats))
        .route("/activities", get(activities))
        .route("/patients", post(register_patient))
        .route("/bookings", post(create_booking))
        .route("/bookings/{id}/status", patch(update_booking_status))
        .layer(middleware::from_fn(require_roles(DESK)));

    reads
        .merge(writes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            clinic_context_middleware,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
