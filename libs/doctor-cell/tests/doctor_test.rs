use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Utc;
use serde_json::json;

use doctor_cell::models::{EmbeddedOrder, SaveAssessmentRequest};
use doctor_cell::services::DoctorService;
use shared_config::AppConfig;
use shared_database::{MemoryStore, Store};
use shared_models::{
    AppError, AuthUser, NewAppointment, NewClinic, NewPatient, OrderType, Role,
};
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

fn doctor(id: i64, clinic_id: i64) -> AuthUser {
    AuthUser {
        id,
        email: format!("doctor{}@clinic.test", id),
        role: Role::Doctor,
        clinic_id: Some(clinic_id),
        impersonated_by: None,
    }
}

async fn seed_clinic(store: &MemoryStore, subdomain: &str) -> i64 {
    store
        .create_clinic(NewClinic {
            name: "Doctor Clinic".to_string(),
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

async fn seed_patient(store: &MemoryStore, clinic_id: i64, name: &str) -> i64 {
    store
        .create_patient(NewPatient {
            clinic_id,
            mrn: format!("P2026-{}", name),
            name: name.to_string(),
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

async fn check_in(store: &MemoryStore, clinic_id: i64, patient_id: i64, doctor_id: i64) -> i64 {
    store
        .create_appointment(NewAppointment {
            clinic_id,
            patient_id,
            doctor_id,
            date: Utc::now().date_naive(),
            time: "09:00".to_string(),
            status: "Checked In".to_string(),
            source: "Walk-In".to_string(),
            fees: None,
            notes: None,
        })
        .await
        .unwrap()
        .id
}

fn assessment(patient_id: i64, orders: Vec<EmbeddedOrder>) -> SaveAssessmentRequest {
    SaveAssessmentRequest {
        patient_id,
        template_id: None,
        record_type: Some("consultation".to_string()),
        data: json!({ "complaint": "headache", "diagnosis": "migraine" }),
        orders,
    }
}

#[tokio::test]
async fn assessment_creates_record_orders_and_notifications() {
    let h = harness();
    let clinic_id = seed_clinic(&h.store, "assess").await;
    let patient_id = seed_patient(&h.store, clinic_id, "Nadia").await;
    let doc = doctor(10, clinic_id);
    check_in(&h.store, clinic_id, patient_id, doc.id).await;

    let outcome = DoctorService::new(&h.state)
        .save_assessment(
            &doc,
            clinic_id,
            assessment(
                patient_id,
                vec![
                    EmbeddedOrder {
                        order_type: OrderType::Lab,
                        test_name: "CBC".to_string(),
                        details: None,
                    },
                    EmbeddedOrder {
                        order_type: OrderType::Pharmacy,
                        test_name: "Sumatriptan".to_string(),
                        details: Some(json!({ "dosage": "50mg" })),
                    },
                ],
            ),
        )
        .await
        .unwrap();

    assert!(outcome.record.is_closed);
    assert_eq!(outcome.orders.len(), 2);
    assert_eq!(outcome.completed_appointments, 1);

    // One notification per order, routed to the right department queue.
    let notifications = h.store.notifications_by_clinic(clinic_id).await.unwrap();
    let mut departments: Vec<&str> =
        notifications.iter().map(|n| n.department.as_str()).collect();
    departments.sort();
    assert_eq!(departments, vec!["laboratory", "pharmacy"]);

    // The appointment is no longer in the queue.
    let appointment = h
        .store
        .appointments_for_doctor(clinic_id, doc.id, None)
        .await
        .unwrap();
    assert_eq!(appointment[0].status, "Completed");
}

#[tokio::test]
async fn assessment_rejects_a_patient_of_another_clinic() {
    let h = harness();
    let mine = seed_clinic(&h.store, "my-assess").await;
    let theirs = seed_clinic(&h.store, "their-assess").await;
    let foreign_patient = seed_patient(&h.store, theirs, "Foreign").await;

    let err = DoctorService::new(&h.state)
        .save_assessment(
            &doctor(11, mine),
            mine,
            assessment(foreign_patient, vec![]),
        )
        .await
        .unwrap_err();
    assert_matches!(err, AppError::NotFound(_));
}

#[tokio::test]
async fn queue_only_lists_actionable_appointments_for_this_doctor() {
    let h = harness();
    let clinic_id = seed_clinic(&h.store, "queue").await;
    let patient_id = seed_patient(&h.store, clinic_id, "Queued").await;
    let doc = doctor(12, clinic_id);

    let appointment_id = check_in(&h.store, clinic_id, patient_id, doc.id).await;
    check_in(&h.store, clinic_id, patient_id, 99).await;
    h.store
        .update_appointment_status(appointment_id, "Completed")
        .await
        .unwrap();

    let queue = DoctorService::new(&h.state)
        .queue(clinic_id, doc.id)
        .await
        .unwrap();
    assert!(queue.is_empty());

    let other_doctor_queue = DoctorService::new(&h.state)
        .queue(clinic_id, 99)
        .await
        .unwrap();
    assert_eq!(other_doctor_queue.len(), 1);
}

#[tokio::test]
async fn assigned_patients_are_strictly_the_doctors_own() {
    let h = harness();
    let clinic_id = seed_clinic(&h.store, "assigned").await;
    let mine = seed_patient(&h.store, clinic_id, "Mine").await;
    let someone_elses = seed_patient(&h.store, clinic_id, "Other").await;
    let doc = doctor(13, clinic_id);

    check_in(&h.store, clinic_id, mine, doc.id).await;
    check_in(&h.store, clinic_id, someone_elses, 99).await;

    let patients = DoctorService::new(&h.state)
        .assigned_patients(clinic_id, doc.id)
        .await
        .unwrap();
    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0].id, mine);
}

#[tokio::test]
async fn orders_view_is_derived_from_assessment_records() {
    let h = harness();
    let clinic_id = seed_clinic(&h.store, "orders-view").await;
    let patient_id = seed_patient(&h.store, clinic_id, "Ordered").await;
    let doc = doctor(14, clinic_id);

    DoctorService::new(&h.state)
        .save_assessment(
            &doc,
            clinic_id,
            assessment(
                patient_id,
                vec![EmbeddedOrder {
                    order_type: OrderType::Radiology,
                    test_name: "Chest X-Ray".to_string(),
                    details: None,
                }],
            ),
        )
        .await
        .unwrap();

    let orders = DoctorService::new(&h.state)
        .orders(clinic_id, doc.id)
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["order"]["test_name"], "Chest X-Ray");
}

#[tokio::test]
async fn revenue_is_consultations_times_flat_fee() {
    let h = harness();
    let clinic_id = seed_clinic(&h.store, "revenue").await;
    let patient_id = seed_patient(&h.store, clinic_id, "Payer").await;
    let doc = doctor(15, clinic_id);
    let service = DoctorService::new(&h.state);

    for _ in 0..3 {
        service
            .save_assessment(&doc, clinic_id, assessment(patient_id, vec![]))
            .await
            .unwrap();
    }

    let summary = service.revenue(clinic_id, doc.id).await.unwrap();
    assert_eq!(summary.consultations, 3);
    assert_eq!(summary.total, 3.0 * summary.consultation_fee);
}
