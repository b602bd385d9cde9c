use std::sync::Arc;

use assert_matches::assert_matches;

use billing_cell::models::{CreateInvoiceRequest, InvoiceStatusRequest};
use billing_cell::services::BillingService;
use shared_config::AppConfig;
use shared_database::{MemoryStore, Store};
use shared_models::{AppError, AuthUser, NewClinic, NewPatient, Role};
use shared_utils::state::AppState;

fn state_with_store() -> (Arc<MemoryStore>, AppState) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(AppConfig::default(), store.clone());
    (store, state)
}

fn receptionist(clinic_id: i64) -> AuthUser {
    AuthUser {
        id: 7,
        email: "desk@clinic.test".to_string(),
        role: Role::Receptionist,
        clinic_id: Some(clinic_id),
        impersonated_by: None,
    }
}

async fn seed_clinic(store: &MemoryStore, subdomain: &str) -> i64 {
    store
        .create_clinic(NewClinic {
            name: "Billing Clinic".to_string(),
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

async fn seed_patient(store: &MemoryStore, clinic_id: i64) -> i64 {
    store
        .create_patient(NewPatient {
            clinic_id,
            mrn: "P20260001".to_string(),
            name: "Billed Patient".to_string(),
            phone: None,
            email: None,
            gender: None,
            address: None,
            medical_history: None,
            status: "active".to_string(),
        })
        .await
        .unwrap()
        .id
}

fn invoice_request(patient_id: i64, amount: f64, paid: bool) -> CreateInvoiceRequest {
    CreateInvoiceRequest {
        patient_id,
        doctor_id: None,
        service: "Consultation".to_string(),
        amount,
        paid,
    }
}

#[tokio::test]
async fn creates_numbered_invoice_with_paid_flag() {
    let (store, state) = state_with_store();
    let clinic_id = seed_clinic(&store, "billing").await;
    let patient_id = seed_patient(&store, clinic_id).await;
    let service = BillingService::new(&state);

    let pending = service
        .create_invoice(
            &receptionist(clinic_id),
            clinic_id,
            invoice_request(patient_id, 350.0, false),
        )
        .await
        .unwrap();
    assert!(pending.id.starts_with("INV-"));
    assert_eq!(pending.status, "Pending");

    let paid = service
        .create_invoice(
            &receptionist(clinic_id),
            clinic_id,
            invoice_request(patient_id, 120.0, true),
        )
        .await
        .unwrap();
    assert_eq!(paid.status, "Paid");

    let stats = service.stats(clinic_id).await.unwrap();
    assert_eq!(stats.invoices, 2);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.collected, 120.0);
}

#[tokio::test]
async fn rejects_negative_amount_and_foreign_patient() {
    let (store, state) = state_with_store();
    let clinic_id = seed_clinic(&store, "billing-a").await;
    let other_clinic = seed_clinic(&store, "billing-b").await;
    let patient_id = seed_patient(&store, clinic_id).await;
    let service = BillingService::new(&state);

    let err = service
        .create_invoice(
            &receptionist(clinic_id),
            clinic_id,
            invoice_request(patient_id, -5.0, false),
        )
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Validation(_));

    let err = service
        .create_invoice(
            &receptionist(other_clinic),
            other_clinic,
            invoice_request(patient_id, 100.0, false),
        )
        .await
        .unwrap_err();
    assert_matches!(err, AppError::NotFound(_));
}

#[tokio::test]
async fn status_update_is_clinic_scoped_and_whitelisted() {
    let (store, state) = state_with_store();
    let clinic_id = seed_clinic(&store, "billing-scope").await;
    let other_clinic = seed_clinic(&store, "billing-other").await;
    let patient_id = seed_patient(&store, clinic_id).await;
    let service = BillingService::new(&state);

    let invoice = service
        .create_invoice(
            &receptionist(clinic_id),
            clinic_id,
            invoice_request(patient_id, 200.0, false),
        )
        .await
        .unwrap();

    let err = service
        .update_status(
            &receptionist(clinic_id),
            clinic_id,
            &invoice.id,
            InvoiceStatusRequest {
                status: "Settled".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Validation(_));

    let err = service
        .update_status(
            &receptionist(other_clinic),
            other_clinic,
            &invoice.id,
            InvoiceStatusRequest {
                status: "Paid".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Forbidden(_));

    let updated = service
        .update_status(
            &receptionist(clinic_id),
            clinic_id,
            &invoice.id,
            InvoiceStatusRequest {
                status: "Paid".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, "Paid");
}
