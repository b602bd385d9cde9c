use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;

use lab_cell::models::CompleteOrderRequest;
use lab_cell::services::DiagnosticsService;
use shared_config::AppConfig;
use shared_database::{MemoryStore, Store};
use shared_models::{
    AppError, AuthUser, NewClinic, NewPatient, NewServiceOrder, OrderType, Role,
};
use shared_utils::state::AppState;

fn state_with_store() -> (Arc<MemoryStore>, AppState) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(AppConfig::default(), store.clone());
    (store, state)
}

fn technician(clinic_id: i64) -> AuthUser {
    AuthUser {
        id: 9,
        email: "lab@clinic.test".to_string(),
        role: Role::Receptionist,
        clinic_id: Some(clinic_id),
        impersonated_by: None,
    }
}

async fn seed_clinic(store: &MemoryStore, subdomain: &str) -> i64 {
    store
        .create_clinic(NewClinic {
            name: "Diagnostics Clinic".to_string(),
            subdomain: subdomain.to_string(),
            location: None,
            email: None,
            contact: None,
            modules: Default::default(),
        })
        .await
        .unwrap()
        .id
}

async fn seed_order(
    store: &MemoryStore,
    clinic_id: i64,
    order_type: OrderType,
    test_name: &str,
) -> i64 {
    let patient = store
        .create_patient(NewPatient {
            clinic_id,
            mrn: format!("P2026-{}", test_name),
            name: "Diagnostics Patient".to_string(),
            phone: None,
            email: None,
            gender: None,
            address: None,
            medical_history: None,
            status: "active".to_string(),
        })
        .await
        .unwrap();
    store
        .create_order(NewServiceOrder {
            clinic_id,
            patient_id: patient.id,
            doctor_id: 3,
            order_type,
            test_name: test_name.to_string(),
            details: None,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn completion_attaches_result_and_raises_lab_invoice() {
    let (store, state) = state_with_store();
    let clinic_id = seed_clinic(&store, "lab").await;
    let order_id = seed_order(&store, clinic_id, OrderType::Lab, "CBC").await;

    let outcome = DiagnosticsService::new(&state, OrderType::Lab)
        .complete_order(
            &technician(clinic_id),
            clinic_id,
            order_id,
            CompleteOrderRequest {
                result: json!({ "wbc": 6.1, "hgb": 13.8 }),
                price: 45.0,
                paid: true,
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.order.status, "Completed");
    assert_eq!(outcome.order.result.as_ref().unwrap()["wbc"], 6.1);
    assert!(outcome.invoice.id.starts_with("LAB-"));
    assert_eq!(outcome.invoice.status, "Paid");
    assert_eq!(outcome.invoice.amount, 45.0);
}

#[tokio::test]
async fn radiology_completion_bills_with_rad_prefix_pending() {
    let (store, state) = state_with_store();
    let clinic_id = seed_clinic(&store, "radiology").await;
    let order_id = seed_order(&store, clinic_id, OrderType::Radiology, "Chest X-Ray").await;

    let outcome = DiagnosticsService::new(&state, OrderType::Radiology)
        .complete_order(
            &technician(clinic_id),
            clinic_id,
            order_id,
            CompleteOrderRequest {
                result: json!({ "impression": "clear" }),
                price: 120.0,
                paid: false,
            },
        )
        .await
        .unwrap();

    assert!(outcome.invoice.id.starts_with("RAD-"));
    assert_eq!(outcome.invoice.status, "Pending");
}

#[tokio::test]
async fn queue_is_scoped_by_type_and_open_status() {
    let (store, state) = state_with_store();
    let clinic_id = seed_clinic(&store, "lab-queue").await;
    let lab_order = seed_order(&store, clinic_id, OrderType::Lab, "Lipid Panel").await;
    seed_order(&store, clinic_id, OrderType::Radiology, "MRI").await;

    let lab = DiagnosticsService::new(&state, OrderType::Lab);
    let queue = lab.queue(clinic_id).await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, lab_order);

    lab.reject_order(&technician(clinic_id), clinic_id, lab_order)
        .await
        .unwrap();
    assert!(lab.queue(clinic_id).await.unwrap().is_empty());

    let stats = lab.stats(clinic_id).await.unwrap();
    assert_eq!(stats.queued, 0);
    assert_eq!(stats.rejected, 1);
}

#[tokio::test]
async fn orders_of_other_clinics_or_wrong_type_are_invisible() {
    let (store, state) = state_with_store();
    let clinic_id = seed_clinic(&store, "lab-a").await;
    let other_clinic = seed_clinic(&store, "lab-b").await;
    let order_id = seed_order(&store, clinic_id, OrderType::Lab, "Glucose").await;

    let err = DiagnosticsService::new(&state, OrderType::Lab)
        .reject_order(&technician(other_clinic), other_clinic, order_id)
        .await
        .unwrap_err();
    assert_matches!(err, AppError::NotFound(_));

    let err = DiagnosticsService::new(&state, OrderType::Radiology)
        .reject_order(&technician(clinic_id), clinic_id, order_id)
        .await
        .unwrap_err();
    assert_matches!(err, AppError::NotFound(_));
}

#[tokio::test]
async fn completed_orders_cannot_be_reprocessed() {
    let (store, state) = state_with_store();
    let clinic_id = seed_clinic(&store, "lab-done").await;
    let order_id = seed_order(&store, clinic_id, OrderType::Lab, "TSH").await;
    let service = DiagnosticsService::new(&state, OrderType::Lab);

    service
        .complete_order(
            &technician(clinic_id),
            clinic_id,
            order_id,
            CompleteOrderRequest {
                result: json!({ "tsh": 2.0 }),
                price: 30.0,
                paid: false,
            },
        )
        .await
        .unwrap();

    let err = service
        .reject_order(&technician(clinic_id), clinic_id, order_id)
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Validation(_));
}
