use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shared_models::{Appointment, Invoice, Patient};

#[derive(Debug, Deserialize)]
pub struct PatientSearchQuery {
    pub search: Option<String>,
}

/// Walk-in registration. A doctor plus consultation fee books the patient
/// straight into today's queue with a pending invoice.
#[derive(Debug, Deserialize)]
pub struct RegisterPatientRequest {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub medical_history: Option<String>,
    pub doctor_id: Option<i64>,
    pub fees: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct RegistrationOutcome {
    pub patient: Patient,
    pub appointment: Option<Appointment>,
    pub invoice: Option<Invoice>,
}

#[derive(Debug, Deserialize)]
pub struct BookingsQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time: String,
    pub fees: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BookingStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ReceptionStats {
    pub patients: u64,
    pub bookings_today: usize,
    pub checked_in: usize,
    pub pending_invoices: usize,
}
