use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;

use shared_database::Store;
use shared_models::{
    AppError, Appointment, AuditEntry, AuthUser, FormTemplate, MedicalRecord, NewAuditEntry,
    NewMedicalRecord, NewNotification, NewServiceOrder, Patient,
};
use shared_utils::audit;
use shared_utils::state::AppState;

use crate::models::{
    AssessmentOutcome, DoctorStats, RevenueSummary, SaveAssessmentRequest,
};

/// Flat per-consultation fee used for the doctor's revenue summary.
const CONSULTATION_FEE: f64 = 350.0;

pub struct DoctorService {
    store: Arc<dyn Store>,
}

impl DoctorService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    pub async fn queue(
        &self,
        clinic_id: i64,
        doctor_id: i64,
    ) -> Result<Vec<Appointment>, AppError> {
        let today = Utc::now().date_naive();
        let mut appointments = self
            .store
            .appointments_for_doctor(clinic_id, doctor_id, Some(today))
            .await?;
        appointments.retain(|a| a.status == "Checked In" || a.status == "Approved");
        Ok(appointments)
    }

    pub async fn stats(&self, clinic_id: i64, doctor_id: i64) -> Result<DoctorStats, AppError> {
        let today = Utc::now().date_naive();
        let todays = self
            .store
            .appointments_for_doctor(clinic_id, doctor_id, Some(today))
            .await?;
        let records = self.store.records_for_doctor(clinic_id, doctor_id).await?;

        Ok(DoctorStats {
            queue_today: todays
                .iter()
                .filter(|a| a.status == "Checked In" || a.status == "Approved")
                .count(),
            completed_today: todays.iter().filter(|a| a.status == "Completed").count(),
            patients_seen: records.len(),
            revenue: records.len() as f64 * CONSULTATION_FEE,
        })
    }

    pub async fn activities(&self, clinic_id: i64) -> Result<Vec<AuditEntry>, AppError> {
        self.store.audit_for_clinic(clinic_id, 20).await
    }

    pub async fn revenue(
        &self,
        clinic_id: i64,
        doctor_id: i64,
    ) -> Result<RevenueSummary, AppError> {
        let records = self.store.records_for_doctor(clinic_id, doctor_id).await?;
        Ok(RevenueSummary {
            consultations: records.len(),
            consultation_fee: CONSULTATION_FEE,
            total: records.len() as f64 * CONSULTATION_FEE,
        })
    }

    pub async fn templates(&self, clinic_id: i64) -> Result<Vec<FormTemplate>, AppError> {
        self.store.templates_for_clinic(clinic_id, true).await
    }

    /// Patients this doctor has actually seen: an appointment or a record
    /// with them in this clinic. The clinic-wide list stays with reception.
    pub async fn assigned_patients(
        &self,
        clinic_id: i64,
        doctor_id: i64,
    ) -> Result<Vec<Patient>, AppError> {
        let appointments = self
            .store
            .appointments_for_doctor(clinic_id, doctor_id, None)
            .await?;
        let records = self.store.records_for_doctor(clinic_id, doctor_id).await?;

        let mut ids: HashSet<i64> = appointments.iter().map(|a| a.patient_id).collect();
        ids.extend(records.iter().map(|r| r.patient_id));

        let mut patients = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(patient) = self.store.patient_by_id(id).await? {
                if patient.clinic_id == clinic_id {
                    patients.push(patient);
                }
            }
        }
        patients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(patients)
    }

    pub async fn patient_history(
        &self,
        clinic_id: i64,
        patient_id: i64,
    ) -> Result<Vec<MedicalRecord>, AppError> {
        let patient = self
            .store
            .patient_by_id(patient_id)
            .await?
            .filter(|p| p.clinic_id == clinic_id)
            .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))?;
        self.store.records_for_patient(clinic_id, patient.id).await
    }

    /// The doctor's past order sheet, reconstructed from assessment records.
    pub async fn orders(
        &self,
        clinic_id: i64,
        doctor_id: i64,
    ) -> Result<Vec<serde_json::Value>, AppError> {
        let records = self.store.records_for_doctor(clinic_id, doctor_id).await?;
        let mut orders = Vec::new();
        for record in records {
            let Some(embedded) = record.data.get("orders").and_then(|o| o.as_array()) else {
                continue;
            };
            for order in embedded {
                orders.push(json!({
                    "record_id": record.id,
                    "patient_id": record.patient_id,
                    "ordered_at": record.created_at,
                    "order": order,
                }));
            }
        }
        Ok(orders)
    }

    /// Writes the closed assessment record, fans each embedded order out to
    /// its department (one ServiceOrder plus one queue notification), then
    /// completes today's checked-in appointment.
    pub async fn save_assessment(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        request: SaveAssessmentRequest,
    ) -> Result<AssessmentOutcome, AppError> {
        let patient = self
            .store
            .patient_by_id(request.patient_id)
            .await?
            .filter(|p| p.clinic_id == clinic_id)
            .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))?;

        let mut data = request.data;
        if !request.orders.is_empty() {
            data["orders"] = json!(request.orders);
        }

        let record = self
            .store
            .create_record(NewMedicalRecord {
                clinic_id,
                patient_id: patient.id,
                doctor_id: actor.id,
                template_id: request.template_id,
                record_type: request.record_type,
                data,
                is_closed: true,
            })
            .await?;

        let mut orders = Vec::with_capacity(request.orders.len());
        for embedded in &request.orders {
            let order = self
                .store
                .create_order(NewServiceOrder {
                    clinic_id,
                    patient_id: patient.id,
                    doctor_id: actor.id,
                    order_type: embedded.order_type,
                    test_name: embedded.test_name.clone(),
                    details: embedded.details.clone(),
                })
                .await?;

            self.store
                .create_notification(NewNotification {
                    clinic_id,
                    department: embedded.order_type.department().to_string(),
                    message: json!({
                        "order_id": order.id,
                        "patient_id": patient.id,
                        "patient_name": patient.name,
                        "test_name": order.test_name,
                    }),
                })
                .await?;
            orders.push(order);
        }

        let completed = self
            .store
            .complete_checked_in(clinic_id, patient.id, actor.id)
            .await?;

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Assessment Saved", &actor.email)
                .user(actor.id)
                .clinic(clinic_id)
                .details(json!({
                    "record_id": record.id,
                    "patient_id": patient.id,
                    "orders": orders.len(),
                })),
        )
        .await;
        info!(
            "Assessment {} saved with {} order(s), {} appointment(s) completed",
            record.id,
            orders.len(),
            completed
        );

        Ok(AssessmentOutcome {
            record,
            orders,
            completed_appointments: completed,
        })
    }
}
