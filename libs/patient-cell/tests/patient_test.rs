use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::NaiveDate;

use patient_cell::models::PortalBookingRequest;
use patient_cell::services::PortalService;
use shared_config::AppConfig;
use shared_database::{MemoryStore, Store};
use shared_models::{
    AppError, AuthUser, BookingConfig, ClinicPatch, NewClinic, NewInvoice, NewPatient,
    NewStaff, NewUser, Role,
};
use shared_utils::state::AppState;

const PATIENT_EMAIL: &str = "pat@portal.test";

fn state_with_store() -> (Arc<MemoryStore>, AppState) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(AppConfig::default(), store.clone());
    (store, state)
}

fn portal_user() -> AuthUser {
    AuthUser {
        id: 20,
        email: PATIENT_EMAIL.to_string(),
        role: Role::Patient,
        clinic_id: None,
        impersonated_by: None,
    }
}

async fn seed_clinic(store: &MemoryStore, subdomain: &str) -> i64 {
    store
        .create_clinic(NewClinic {
            name: "Portal Clinic".to_string(),
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

async fn seed_patient(store: &MemoryStore, clinic_id: i64, email: &str) -> i64 {
    store
        .create_patient(NewPatient {
            clinic_id,
            mrn: format!("P2026-{}", clinic_id),
            name: "Portal Patient".to_string(),
            phone: None,
            email: Some(email.to_string()),
            gender: None,
            address: None,
            medical_history: None,
            status: "active".to_string(),
        })
        .await
        .unwrap()
        .id
}

fn booking(clinic_id: i64) -> PortalBookingRequest {
    PortalBookingRequest {
        clinic_id,
        doctor_id: 3,
        date: NaiveDate::from_ymd_opt(2026, 9, 1).unwrap(),
        time: "10:30".to_string(),
        notes: None,
    }
}

#[tokio::test]
async fn my_views_span_every_clinic_linked_by_email() {
    let (store, state) = state_with_store();
    let first = seed_clinic(&store, "portal-a").await;
    let second = seed_clinic(&store, "portal-b").await;
    let mine_a = seed_patient(&store, first, PATIENT_EMAIL).await;
    let mine_b = seed_patient(&store, second, PATIENT_EMAIL).await;
    let not_mine = seed_patient(&store, first, "someone@else.test").await;

    for (clinic_id, patient_id) in [(first, mine_a), (second, mine_b), (first, not_mine)] {
        store
            .create_invoice(NewInvoice {
                id: format!("INV-{}", patient_id),
                clinic_id,
                patient_id,
                doctor_id: None,
                service: "Consultation".to_string(),
                amount: 100.0,
                status: "Pending".to_string(),
            })
            .await
            .unwrap();
    }

    let invoices = PortalService::new(&state)
        .my_invoices(&portal_user())
        .await
        .unwrap();
    assert_eq!(invoices.len(), 2);
    assert!(invoices.iter().all(|i| i.patient_id != not_mine));
}

#[tokio::test]
async fn booking_requires_a_patient_record_at_that_clinic() {
    let (store, state) = state_with_store();
    let clinic_id = seed_clinic(&store, "portal-new").await;

    let err = PortalService::new(&state)
        .book(&portal_user(), booking(clinic_id))
        .await
        .unwrap_err();
    assert_matches!(err, AppError::NotFound(_));

    let err = PortalService::new(&state)
        .book(&portal_user(), booking(999))
        .await
        .unwrap_err();
    assert_matches!(err, AppError::NotFound(_));
}

#[tokio::test]
async fn booking_starts_pending_unless_the_clinic_auto_approves() {
    let (store, state) = state_with_store();
    let manual = seed_clinic(&store, "portal-manual").await;
    let auto = seed_clinic(&store, "portal-auto").await;
    seed_patient(&store, manual, PATIENT_EMAIL).await;
    seed_patient(&store, auto, PATIENT_EMAIL).await;
    store
        .update_clinic(
            auto,
            ClinicPatch {
                booking_config: Some(BookingConfig {
                    auto_approve: true,
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let service = PortalService::new(&state);
    let pending = service.book(&portal_user(), booking(manual)).await.unwrap();
    assert_eq!(pending.status, "Pending");
    assert_eq!(pending.source, "Patient Portal");

    let approved = service.book(&portal_user(), booking(auto)).await.unwrap();
    assert_eq!(approved.status, "Approved");
}

#[tokio::test]
async fn doctor_directory_lists_only_doctors_with_their_profile() {
    let (store, state) = state_with_store();
    let clinic_id = seed_clinic(&store, "portal-docs").await;

    let doctor = store
        .create_user(NewUser {
            email: "doc@portal.test".to_string(),
            password_hash: "hash".to_string(),
            name: "Dr Portal".to_string(),
            phone: None,
            role: Role::Doctor,
        })
        .await
        .unwrap();
    let clerk = store
        .create_user(NewUser {
            email: "clerk@portal.test".to_string(),
            password_hash: "hash".to_string(),
            name: "Desk Clerk".to_string(),
            phone: None,
            role: Role::Receptionist,
        })
        .await
        .unwrap();
    for (user_id, role) in [(doctor.id, Role::Doctor), (clerk.id, Role::Receptionist)] {
        store
            .create_staff(NewStaff {
                user_id,
                clinic_id,
                role,
                department: Some("general".to_string()),
                specialty: None,
            })
            .await
            .unwrap();
    }

    let doctors = PortalService::new(&state).doctors(clinic_id).await.unwrap();
    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0].name, "Dr Portal");
    assert_eq!(doctors[0].department.as_deref(), Some("general"));
}
