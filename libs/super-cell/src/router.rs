use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};

use shared_models::Role;
use shared_utils::extractor::auth_middleware;
use shared_utils::guard::require_roles;
use shared_utils::state::AppState;

use crate::handlers::*;

pub fn create_super_router(state: AppState) -> Router {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/alerts", get(alerts))
        .route("/clinics", get(list_clinics))
        .route("/clinics", post(create_clinic))
        .route("/clinics/{id}", put(update_clinic))
        .route("/clinics/{id}", delete(delete_clinic))
        .route("/clinics/{id}/status", patch(toggle_clinic_status))
        .route("/clinics/{id}/modules", put(update_modules))
        .route("/clinics/{id}/admin", post(provision_admin))
        .route("/staff", get(global_staff))
        .route("/staff/{id}", put(update_staff))
        .route("/staff/{id}", delete(delete_staff))
        .route("/staff/{id}/status", patch(toggle_staff_status))
        .route("/audit", get(search_audit))
        .route("/settings", get(settings))
        .route("/storage", get(storage_stats))
        .route("/backup", post(trigger_backup))
        .route("/impersonate/user", post(impersonate_user))
        .route("/impersonate/clinic", post(impersonate_clinic))
        .layer(middleware::from_fn(require_roles(&[Role::SuperAdmin])))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
