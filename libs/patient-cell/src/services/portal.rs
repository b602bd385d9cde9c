use std::sync::Arc;

use serde_json::json;
use tracing::info;

use shared_database::Store;
use shared_models::{
    AppError, Appointment, AuthUser, Invoice, MedicalRecord, NewAppointment, NewAuditEntry,
    Role,
};
use shared_utils::audit;
use shared_utils::state::AppState;

use crate::models::{DoctorListing, PortalBookingRequest};

/// Portal reads are keyed by the signed-in user's email. A person can be a
/// patient of several clinics, so "my" views span every patient record that
/// carries that email.
pub struct PortalService {
    store: Arc<dyn Store>,
}

impl PortalService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    pub async fn my_appointments(&self, actor: &AuthUser) -> Result<Vec<Appointment>, AppError> {
        let ids = self.my_patient_ids(actor).await?;
        self.store.appointments_for_patients(&ids).await
    }

    pub async fn my_records(&self, actor: &AuthUser) -> Result<Vec<MedicalRecord>, AppError> {
        let ids = self.my_patient_ids(actor).await?;
        self.store.records_for_patients(&ids).await
    }

    pub async fn my_invoices(&self, actor: &AuthUser) -> Result<Vec<Invoice>, AppError> {
        let ids = self.my_patient_ids(actor).await?;
        self.store.invoices_for_patients(&ids).await
    }

    pub async fn doctors(&self, clinic_id: i64) -> Result<Vec<DoctorListing>, AppError> {
        self.store
            .clinic_by_id(clinic_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Clinic not found".to_string()))?;

        let staff = self.store.staff_for_clinic(clinic_id).await?;
        let mut doctors = Vec::new();
        for member in staff.into_iter().filter(|s| s.role == Role::Doctor) {
            let Some(user) = self.store.user_by_id(member.user_id).await? else {
                continue;
            };
            doctors.push(DoctorListing {
                user_id: user.id,
                name: user.name,
                department: member.department,
                specialty: member.specialty,
            });
        }
        doctors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(doctors)
    }

    /// Books an appointment at a clinic the caller is already a patient of.
    /// The clinic's booking config decides whether it starts out approved.
    pub async fn book(
        &self,
        actor: &AuthUser,
        request: PortalBookingRequest,
    ) -> Result<Appointment, AppError> {
        let clinic = self
            .store
            .clinic_by_id(request.clinic_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Clinic not found".to_string()))?;

        let patient = self
            .store
            .patients_by_email(&actor.email)
            .await?
            .into_iter()
            .find(|p| p.clinic_id == clinic.id)
            .ok_or_else(|| {
                AppError::NotFound("No patient record at this clinic".to_string())
            })?;

        let auto_approve = clinic
            .booking_config
            .map(|c| c.auto_approve)
            .unwrap_or(false);

        let appointment = self
            .store
            .create_appointment(NewAppointment {
                clinic_id: clinic.id,
                patient_id: patient.id,
                doctor_id: request.doctor_id,
                date: request.date,
                time: request.time,
                status: if auto_approve { "Approved" } else { "Pending" }.to_string(),
                source: "Patient Portal".to_string(),
                fees: None,
                notes: request.notes,
            })
            .await?;

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Portal Booking Created", &actor.email)
                .user(actor.id)
                .clinic(clinic.id)
                .details(json!({
                    "appointment_id": appointment.id,
                    "status": appointment.status,
                })),
        )
        .await;
        info!(
            "Portal booking {} created as {}",
            appointment.id, appointment.status
        );
        Ok(appointment)
    }

    async fn my_patient_ids(&self, actor: &AuthUser) -> Result<Vec<i64>, AppError> {
        Ok(self
            .store
            .patients_by_email(&actor.email)
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect())
    }
}
