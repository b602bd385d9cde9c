use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Datelike, Utc};

use reception_cell::models::{CreateBookingRequest, RegisterPatientRequest};
use reception_cell::services::ReceptionService;
use shared_config::AppConfig;
use shared_database::{MemoryStore, Store};
use shared_models::{AppError, AuthUser, NewClinic, Role};
use shared_utils::state::AppState;

struct Harness {
    store: Arc<MemoryStore>,
    state: AppState,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(AppConfig::default(), store.clone());
    Harness { store, state }
}

fn receptionist(clinic_id: i64) -> AuthUser {
    AuthUser {
        id: 1,
        email: "desk@clinic.test".to_string(),
        role: Role::Receptionist,
        clinic_id: Some(clinic_id),
        impersonated_by: None,
    }
}

async fn seed_clinic(store: &MemoryStore, subdomain: &str) -> i64 {
    store
        .create_clinic(NewClinic {
            name: "Reception Clinic".to_string(),
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

fn walk_in(doctor_id: Option<i64>, fees: Option<f64>) -> RegisterPatientRequest {
    RegisterPatientRequest {
        name: "Walk In".to_string(),
        phone: Some("0300-1234567".to_string()),
        email: None,
        gender: None,
        address: None,
        medical_history: None,
        doctor_id,
        fees,
    }
}

#[tokio::test]
async fn plain_registration_creates_only_the_patient() {
    let h = harness();
    let clinic_id = seed_clinic(&h.store, "plain").await;

    let outcome = ReceptionService::new(&h.state)
        .register_patient(&receptionist(clinic_id), clinic_id, walk_in(None, None))
        .await
        .unwrap();

    assert!(outcome.appointment.is_none());
    assert!(outcome.invoice.is_none());
    let year = Utc::now().year();
    assert_eq!(outcome.patient.mrn, format!("P{}0001", year));
}

#[tokio::test]
async fn walk_in_with_doctor_and_fee_checks_in_and_invoices() {
    let h = harness();
    let clinic_id = seed_clinic(&h.store, "walkin").await;

    let outcome = ReceptionService::new(&h.state)
        .register_patient(
            &receptionist(clinic_id),
            clinic_id,
            walk_in(Some(42), Some(500.0)),
        )
        .await
        .unwrap();

    let appointment = outcome.appointment.unwrap();
    assert_eq!(appointment.status, "Checked In");
    assert_eq!(appointment.source, "Walk-In");
    assert_eq!(appointment.doctor_id, 42);

    let invoice = outcome.invoice.unwrap();
    assert!(invoice.id.starts_with("INV-"));
    assert_eq!(invoice.amount, 500.0);
    assert_eq!(invoice.status, "Pending");
}

#[tokio::test]
async fn mrn_sequence_counts_per_clinic() {
    let h = harness();
    let first = seed_clinic(&h.store, "first").await;
    let second = seed_clinic(&h.store, "second").await;
    let service = ReceptionService::new(&h.state);

    service
        .register_patient(&receptionist(first), first, walk_in(None, None))
        .await
        .unwrap();
    service
        .register_patient(&receptionist(first), first, walk_in(None, None))
        .await
        .unwrap();
    let other = service
        .register_patient(&receptionist(second), second, walk_in(None, None))
        .await
        .unwrap();

    let year = Utc::now().year();
    assert_eq!(other.patient.mrn, format!("P{}0001", year));
}

#[tokio::test]
async fn booking_requires_a_patient_of_this_clinic() {
    let h = harness();
    let mine = seed_clinic(&h.store, "mine").await;
    let theirs = seed_clinic(&h.store, "theirs").await;
    let service = ReceptionService::new(&h.state);

    let foreign = service
        .register_patient(&receptionist(theirs), theirs, walk_in(None, None))
        .await
        .unwrap();

    let err = service
        .create_booking(
            &receptionist(mine),
            mine,
            CreateBookingRequest {
                patient_id: foreign.patient.id,
                doctor_id: 9,
                date: Utc::now().date_naive(),
                time: "10:00".to_string(),
                fees: None,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, AppError::NotFound(_));
}

#[tokio::test]
async fn status_update_is_clinic_scoped_and_validated() {
    let h = harness();
    let mine = seed_clinic(&h.store, "scoped").await;
    let theirs = seed_clinic(&h.store, "foreign").await;
    let service = ReceptionService::new(&h.state);

    let outcome = service
        .register_patient(
            &receptionist(theirs),
            theirs,
            walk_in(Some(5), Some(100.0)),
        )
        .await
        .unwrap();
    let appointment_id = outcome.appointment.unwrap().id;

    let err = service
        .update_booking_status(&receptionist(mine), mine, appointment_id, "Completed")
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Forbidden(_));

    let err = service
        .update_booking_status(&receptionist(theirs), theirs, appointment_id, "Lost")
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Validation(_));

    let updated = service
        .update_booking_status(&receptionist(theirs), theirs, appointment_id, "Completed")
        .await
        .unwrap();
    assert_eq!(updated.status, "Completed");
}

#[tokio::test]
async fn patient_search_matches_name_phone_and_mrn() {
    let h = harness();
    let clinic_id = seed_clinic(&h.store, "search").await;
    let service = ReceptionService::new(&h.state);

    service
        .register_patient(&receptionist(clinic_id), clinic_id, walk_in(None, None))
        .await
        .unwrap();

    let by_name = service
        .patients(clinic_id, Some("walk"))
        .await
        .unwrap();
    assert_eq!(by_name.len(), 1);

    let by_phone = service
        .patients(clinic_id, Some("0300"))
        .await
        .unwrap();
    assert_eq!(by_phone.len(), 1);

    let none = service.patients(clinic_id, Some("zzz")).await.unwrap();
    assert!(none.is_empty());
}
