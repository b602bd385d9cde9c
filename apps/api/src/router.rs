use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use auth_cell::router::create_auth_router;
use billing_cell::router::create_billing_router;
use clinic_cell::router::{create_clinic_router, create_departments_router, create_forms_router};
use doctor_cell::router::create_doctor_router;
use lab_cell::router::{create_lab_router, create_radiology_router};
use patient_cell::router::create_patient_router;
use pharmacy_cell::router::create_pharmacy_router;
use reception_cell::router::create_reception_router;
use shared_utils::state::AppState;
use super_cell::router::create_super_router;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state.clone())
        .nest("/auth", create_auth_router(state.clone()))
        .nest("/super", create_super_router(state.clone()))
        .nest("/clinic", create_clinic_router(state.clone()))
        .nest("/departments", create_departments_router(state.clone()))
        .nest("/forms", create_forms_router(state.clone()))
        .nest("/reception", create_reception_router(state.clone()))
        .nest("/doctor", create_doctor_router(state.clone()))
        .nest("/billing", create_billing_router(state.clone()))
        .nest("/pharmacy", create_pharmacy_router(state.clone()))
        .nest("/lab", create_lab_router(state.clone()))
        .nest("/radiology", create_radiology_router(state.clone()))
        .nest("/patient", create_patient_router(state))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "environment": state.config.environment,
            "uptime_seconds": state.uptime_seconds(),
        },
    }))
}
