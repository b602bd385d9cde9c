use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use serde_json::json;

use shared_database::Store;
use shared_models::{
    AppError, Appointment, AuditEntry, AuthUser, NewAppointment, NewAuditEntry, NewInvoice,
    NewPatient, Patient,
};
use shared_utils::state::AppState;
use shared_utils::{audit, ids};

use crate::models::{
    CreateBookingRequest, ReceptionStats, RegisterPatientRequest, RegistrationOutcome,
};

pub struct ReceptionService {
    store: Arc<dyn Store>,
}

impl ReceptionService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    pub async fn stats(&self, clinic_id: i64) -> Result<ReceptionStats, AppError> {
        let today = Utc::now().date_naive();
        let bookings = self
            .store
            .appointments_by_clinic(clinic_id, Some(today))
            .await?;
        let invoices = self.store.invoices_by_clinic(clinic_id).await?;

        Ok(ReceptionStats {
            patients: self.store.count_patients(Some(clinic_id)).await?,
            bookings_today: bookings.len(),
            checked_in: bookings.iter().filter(|a| a.status == "Checked In").count(),
            pending_invoices: invoices.iter().filter(|i| i.status == "Pending").count(),
        })
    }

    pub async fn activities(&self, clinic_id: i64) -> Result<Vec<AuditEntry>, AppError> {
        self.store.audit_for_clinic(clinic_id, 20).await
    }

    pub async fn patients(
        &self,
        clinic_id: i64,
        search: Option<&str>,
    ) -> Result<Vec<Patient>, AppError> {
        self.store.patients_by_clinic(clinic_id, search).await
    }

    /// Registers a walk-in. With a doctor and a consultation fee the patient
    /// is checked straight in and the fee is invoiced.
    pub async fn register_patient(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        request: RegisterPatientRequest,
    ) -> Result<RegistrationOutcome, AppError> {
        if request.name.trim().is_empty() {
            return Err(AppError::Validation("Patient name is required".to_string()));
        }

        let now = Utc::now();
        let seq = self.store.count_patients(Some(clinic_id)).await? + 1;
        let mrn = ids::medical_record_number(now.year(), seq);

        let patient = self
            .store
            .create_patient(NewPatient {
                clinic_id,
                mrn,
                name: request.name,
                phone: request.phone,
                email: request.email,
                gender: request.gender,
                address: request.address,
                medical_history: request.medical_history,
                status: "active".to_string(),
            })
            .await?;

        let mut appointment = None;
        let mut invoice = None;
        if let Some(doctor_id) = request.doctor_id {
            let appt = self
                .store
                .create_appointment(NewAppointment {
                    clinic_id,
                    patient_id: patient.id,
                    doctor_id,
                    date: now.date_naive(),
                    time: now.format("%H:%M").to_string(),
                    status: "Checked In".to_string(),
                    source: "Walk-In".to_string(),
                    fees: request.fees,
                    notes: None,
                })
                .await?;
            appointment = Some(appt);

            if let Some(fees) = request.fees {
                let inv = self
                    .store
                    .create_invoice(NewInvoice {
                        id: ids::invoice_number("INV"),
                        clinic_id,
                        patient_id: patient.id,
                        doctor_id: Some(doctor_id),
                        service: "Consultation".to_string(),
                        amount: fees,
                        status: "Pending".to_string(),
                    })
                    .await?;
                invoice = Some(inv);
            }
        }

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Patient Registered", &actor.email)
                .user(actor.id)
                .clinic(clinic_id)
                .details(json!({ "patient_id": patient.id, "mrn": patient.mrn })),
        )
        .await;

        Ok(RegistrationOutcome {
            patient,
            appointment,
            invoice,
        })
    }

    pub async fn bookings(
        &self,
        clinic_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Appointment>, AppError> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());
        self.store.appointments_by_clinic(clinic_id, Some(date)).await
    }

    pub async fn create_booking(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        request: CreateBookingRequest,
    ) -> Result<RegistrationOutcome, AppError> {
        let patient = self
            .store
            .patient_by_id(request.patient_id)
            .await?
            .filter(|p| p.clinic_id == clinic_id)
            .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))?;

        let appointment = self
            .store
            .create_appointment(NewAppointment {
                clinic_id,
                patient_id: patient.id,
                doctor_id: request.doctor_id,
                date: request.date,
                time: request.time,
                status: "Approved".to_string(),
                source: "Reception".to_string(),
                fees: request.fees,
                notes: request.notes,
            })
            .await?;

        let mut invoice = None;
        if let Some(fees) = request.fees {
            let inv = self
                .store
                .create_invoice(NewInvoice {
                    id: ids::invoice_number("INV"),
                    clinic_id,
                    patient_id: patient.id,
                    doctor_id: Some(request.doctor_id),
                    service: "Consultation".to_string(),
                    amount: fees,
                    status: "Pending".to_string(),
                })
                .await?;
            invoice = Some(inv);
        }

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Appointment Created", &actor.email)
                .user(actor.id)
                .clinic(clinic_id)
                .details(json!({ "appointment_id": appointment.id })),
        )
        .await;

        Ok(RegistrationOutcome {
            patient,
            appointment: Some(appointment),
            invoice,
        })
    }

    pub async fn update_booking_status(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        appointment_id: i64,
        status: &str,
    ) -> Result<Appointment, AppError> {
        let appointment = self
            .store
            .appointment_by_id(appointment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;
        if appointment.clinic_id != clinic_id {
            return Err(AppError::Forbidden(
                "Appointment belongs to another clinic".to_string(),
            ));
        }

        const ALLOWED: &[&str] = &[
            "Pending",
            "Approved",
            "Checked In",
            "Completed",
            "Cancelled",
        ];
        if !ALLOWED.contains(&status) {
            return Err(AppError::Validation(format!(
                "Unknown appointment status '{}'",
                status
            )));
        }

        let updated = self
            .store
            .update_appointment_status(appointment_id, status)
            .await?;

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Appointment Status Updated", &actor.email)
                .user(actor.id)
                .clinic(clinic_id)
                .details(json!({ "appointment_id": appointment_id, "status": status })),
        )
        .await;
        Ok(updated)
    }
}
