use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::roles::Role;

// ---------------------------------------------------------------------------
// Users and staff
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub status: String,
    pub failed_login_attempts: i32,
    pub lockout_until: Option<DateTime<Utc>>,
    pub joined: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// Partial user update; `None` leaves the column untouched. The lockout
/// field is doubly optional so it can be explicitly cleared.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub status: Option<String>,
    pub password_hash: Option<String>,
    pub failed_login_attempts: Option<i32>,
    pub lockout_until: Option<Option<DateTime<Utc>>>,
}

/// The multi-tenancy join table: one user may hold several role rows across
/// clinics, or several roles in one clinic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicStaff {
    pub id: i64,
    pub user_id: i64,
    pub clinic_id: i64,
    pub role: Role,
    pub department: Option<String>,
    pub specialty: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStaff {
    pub user_id: i64,
    pub clinic_id: i64,
    pub role: Role,
    pub department: Option<String>,
    pub specialty: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StaffPatch {
    pub role: Option<Role>,
    pub department: Option<String>,
    pub specialty: Option<String>,
}

// ---------------------------------------------------------------------------
// Clinics
// ---------------------------------------------------------------------------

/// Per-clinic feature flags. Stored as a JSON column at the persistence
/// boundary; deserialized here into an explicit record rather than an opaque
/// blob.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ClinicModules {
    pub pharmacy: bool,
    pub radiology: bool,
    pub laboratory: bool,
    pub billing: bool,
}

impl Default for ClinicModules {
    fn default() -> Self {
        Self {
            pharmacy: true,
            radiology: false,
            laboratory: false,
            billing: true,
        }
    }
}

impl ClinicModules {
    /// Canonical module key for a requested feature name. Matching is
    /// case-insensitive and accepts the short aliases the frontend sends.
    pub fn normalize(name: &str) -> String {
        let key = name.to_ascii_lowercase();
        match key.as_str() {
            "lab" => "laboratory".to_string(),
            "rad" | "xray" | "x-ray" => "radiology".to_string(),
            "rx" => "pharmacy".to_string(),
            _ => key,
        }
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        match Self::normalize(name).as_str() {
            "pharmacy" => self.pharmacy,
            "radiology" => self.radiology,
            "laboratory" => self.laboratory,
            "billing" => self.billing,
            _ => false,
        }
    }

    pub fn enabled_count(&self) -> usize {
        [self.pharmacy, self.radiology, self.laboratory, self.billing]
            .iter()
            .filter(|enabled| **enabled)
            .count()
    }
}

/// Booking rules, also a typed record deserialized at the persistence
/// boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    pub slot_minutes: u32,
    pub open_time: String,
    pub close_time: String,
    pub open_days: Vec<String>,
    pub auto_approve: bool,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            slot_minutes: 30,
            open_time: "09:00".to_string(),
            close_time: "17:00".to_string(),
            open_days: ["Mon", "Tue", "Wed", "Thu", "Fri"]
                .iter()
                .map(|d| d.to_string())
                .collect(),
            auto_approve: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clinic {
    pub id: i64,
    pub name: String,
    pub subdomain: String,
    pub location: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub status: String,
    pub modules: ClinicModules,
    pub booking_config: Option<BookingConfig>,
    pub subscription_starts: Option<DateTime<Utc>>,
    pub subscription_ends: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewClinic {
    pub name: String,
    pub subdomain: String,
    pub location: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub modules: ClinicModules,
}

#[derive(Debug, Clone, Default)]
pub struct ClinicPatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub status: Option<String>,
    pub modules: Option<ClinicModules>,
    pub booking_config: Option<BookingConfig>,
}

// ---------------------------------------------------------------------------
// Patients, appointments, billing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub clinic_id: i64,
    pub mrn: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub medical_history: Option<String>,
    pub status: String,
    pub created_year: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPatient {
    pub clinic_id: i64,
    pub mrn: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub medical_history: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub clinic_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time: String,
    pub status: String,
    pub source: String,
    pub fees: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub clinic_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time: String,
    pub status: String,
    pub source: String,
    pub fees: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub clinic_id: i64,
    pub patient_id: i64,
    pub doctor_id: Option<i64>,
    pub service: String,
    pub amount: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub id: String,
    pub clinic_id: i64,
    pub patient_id: i64,
    pub doctor_id: Option<i64>,
    pub service: String,
    pub amount: f64,
    pub status: String,
}

// ---------------------------------------------------------------------------
// Service orders, inventory, notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Lab,
    Radiology,
    Pharmacy,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Lab => "LAB",
            OrderType::Radiology => "RADIOLOGY",
            OrderType::Pharmacy => "PHARMACY",
        }
    }

    /// Invoice number prefix for orders of this type.
    pub fn invoice_prefix(&self) -> &'static str {
        match self {
            OrderType::Lab => "LAB",
            OrderType::Radiology => "RAD",
            OrderType::Pharmacy => "RX",
        }
    }

    /// Department queue that receives notifications for this order type.
    pub fn department(&self) -> &'static str {
        match self {
            OrderType::Lab => "laboratory",
            OrderType::Radiology => "radiology",
            OrderType::Pharmacy => "pharmacy",
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lab, radiology or pharmacy request generated from a doctor's
/// assessment, routed to the relevant department's queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceOrder {
    pub id: i64,
    pub clinic_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub order_type: OrderType,
    pub test_name: String,
    pub details: Option<Value>,
    pub status: String,
    pub result: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewServiceOrder {
    pub clinic_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub order_type: OrderType,
    pub test_name: String,
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub status: Option<String>,
    pub result: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub clinic_id: i64,
    pub name: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub clinic_id: i64,
    pub name: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct InventoryPatch {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<f64>,
    pub expiry_date: Option<NaiveDate>,
}

/// One requested line of a pharmacy order or direct sale.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StockLine {
    pub inventory_id: i64,
    pub quantity: i64,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub clinic_id: i64,
    pub department: String,
    pub message: Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub clinic_id: i64,
    pub department: String,
    pub message: Value,
}

// ---------------------------------------------------------------------------
// Records, templates, departments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: i64,
    pub clinic_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub template_id: Option<i64>,
    pub record_type: Option<String>,
    pub data: Value,
    pub is_closed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMedicalRecord {
    pub clinic_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub template_id: Option<i64>,
    pub record_type: Option<String>,
    pub data: Value,
    pub is_closed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormTemplate {
    pub id: i64,
    /// `None` means a global template visible to every clinic.
    pub clinic_id: Option<i64>,
    pub name: String,
    pub specialty: String,
    pub fields: Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFormTemplate {
    pub clinic_id: Option<i64>,
    pub name: String,
    pub specialty: String,
    pub fields: Value,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub clinic_id: i64,
    pub name: String,
    pub kind: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewDepartment {
    pub clinic_id: i64,
    pub name: String,
    pub kind: Option<String>,
}

// ---------------------------------------------------------------------------
// Audit log and password resets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub action: String,
    pub performed_by: String,
    pub user_id: Option<i64>,
    pub clinic_id: Option<i64>,
    pub ip: Option<String>,
    pub device: Option<String>,
    pub details: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub action: String,
    pub performed_by: String,
    pub user_id: Option<i64>,
    pub clinic_id: Option<i64>,
    pub ip: Option<String>,
    pub device: Option<String>,
    pub details: Option<Value>,
}

impl NewAuditEntry {
    pub fn new(action: &str, performed_by: &str) -> Self {
        Self {
            action: action.to_string(),
            performed_by: performed_by.to_string(),
            user_id: None,
            clinic_id: None,
            ip: None,
            device: None,
            details: None,
        }
    }

    pub fn user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn clinic(mut self, clinic_id: i64) -> Self {
        self.clinic_id = Some(clinic_id);
        self
    }

    pub fn client(mut self, ip: Option<String>, device: Option<String>) -> Self {
        self.ip = ip;
        self.device = device;
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub search: Option<String>,
    pub action: Option<String>,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordReset {
    pub token: Uuid,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_alias_normalization_is_case_insensitive() {
        assert_eq!(ClinicModules::normalize("Lab"), "laboratory");
        assert_eq!(ClinicModules::normalize("LAB"), "laboratory");
        assert_eq!(ClinicModules::normalize("rx"), "pharmacy");
        assert_eq!(ClinicModules::normalize("XRay"), "radiology");
        assert_eq!(ClinicModules::normalize("Billing"), "billing");
    }

    #[test]
    fn disabled_module_stays_disabled_under_alias() {
        let modules = ClinicModules {
            laboratory: false,
            ..ClinicModules::default()
        };
        assert!(!modules.is_enabled("Lab"));
        assert!(!modules.is_enabled("laboratory"));
        assert!(modules.is_enabled("pharmacy"));
    }

    #[test]
    fn unknown_module_is_never_enabled() {
        let modules = ClinicModules::default();
        assert!(!modules.is_enabled("surgery"));
    }

    #[test]
    fn default_modules_match_provisioning_defaults() {
        let modules = ClinicModules::default();
        assert!(modules.pharmacy);
        assert!(modules.billing);
        assert!(!modules.radiology);
        assert!(!modules.laboratory);
        assert_eq!(modules.enabled_count(), 2);
    }
}
