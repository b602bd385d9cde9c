use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_models::Role;
use shared_utils::extractor::auth_middleware;
use shared_utils::guard::require_roles;
use shared_utils::state::AppState;

use crate::handlers::*;

// Patients have no staff membership, so the clinic-context layer does not
// apply here; the clinic id rides in the path or the booking body instead.
pub fn create_patient_router(state: AppState) -> Router {
    Router::new()
        .route("/appointments", get(my_appointments))
        .route("/records", get(my_records))
        .route("/invoices", get(my_invoices))
        .route("/clinics/{clinic_id}/doctors", get(clinic_doctors))
        .route("/bookings", post(book_appointment))
        .layer(middleware::from_fn(require_roles(&[Role::Patient])))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
