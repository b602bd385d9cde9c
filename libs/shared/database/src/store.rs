use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use shared_models::{
    Appointment, AuditEntry, AuditQuery, Clinic, ClinicPatch, ClinicStaff, Department,
    FormTemplate, InventoryItem, InventoryPatch, Invoice, MedicalRecord, NewAppointment,
    NewAuditEntry, NewClinic, NewDepartment, NewFormTemplate, NewInventoryItem, NewInvoice,
    NewMedicalRecord, NewNotification, NewPatient, NewServiceOrder, NewStaff, NewUser,
    Notification, OrderPatch, OrderType, PasswordReset, Patient, ServiceOrder, StaffPatch,
    StockLine, User, UserPatch,
};
use shared_models::AppError;

/// Upper bound on a caller-supplied page size.
pub const MAX_PAGE_SIZE: u64 = 200;

/// Normalizes caller-supplied pagination into a `(limit, offset)` window.
/// Zero means the default page size; oversized values are capped so the
/// offset multiplication cannot overflow.
pub fn page_window(page: u64, limit: u64) -> (u64, u64) {
    let limit = match limit {
        0 => 50,
        n => n.min(MAX_PAGE_SIZE),
    };
    let offset = page.max(1).saturating_sub(1).saturating_mul(limit);
    (limit, offset)
}

/// Persistence gateway. Every domain service receives this as an injected
/// dependency; nothing in the application talks to the backing store any
/// other way. `MemoryStore` backs tests and local development, `RestStore`
/// speaks PostgREST in production.
#[async_trait]
pub trait Store: Send + Sync {
    // -- users --------------------------------------------------------------
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn user_by_id(&self, id: i64) -> Result<Option<User>, AppError>;
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn update_user(&self, id: i64, patch: UserPatch) -> Result<User, AppError>;

    // -- clinic staff -------------------------------------------------------
    async fn staff_for_user(&self, user_id: i64) -> Result<Vec<ClinicStaff>, AppError>;
    async fn staff_for_clinic(&self, clinic_id: i64) -> Result<Vec<ClinicStaff>, AppError>;
    async fn all_staff(&self) -> Result<Vec<ClinicStaff>, AppError>;
    async fn membership(&self, user_id: i64, clinic_id: i64)
        -> Result<Option<ClinicStaff>, AppError>;
    async fn staff_by_id(&self, id: i64) -> Result<Option<ClinicStaff>, AppError>;
    async fn create_staff(&self, staff: NewStaff) -> Result<ClinicStaff, AppError>;
    async fn update_staff(&self, id: i64, patch: StaffPatch) -> Result<ClinicStaff, AppError>;
    async fn delete_staff(&self, id: i64) -> Result<(), AppError>;

    // -- clinics ------------------------------------------------------------
    async fn clinic_by_id(&self, id: i64) -> Result<Option<Clinic>, AppError>;
    async fn clinic_by_subdomain(&self, subdomain: &str) -> Result<Option<Clinic>, AppError>;
    async fn list_clinics(&self) -> Result<Vec<Clinic>, AppError>;
    async fn create_clinic(&self, clinic: NewClinic) -> Result<Clinic, AppError>;
    async fn update_clinic(&self, id: i64, patch: ClinicPatch) -> Result<Clinic, AppError>;
    async fn delete_clinic(&self, id: i64) -> Result<(), AppError>;
    async fn count_clinics(&self) -> Result<u64, AppError>;

    // -- patients -----------------------------------------------------------
    async fn patients_by_clinic(
        &self,
        clinic_id: i64,
        search: Option<&str>,
    ) -> Result<Vec<Patient>, AppError>;
    async fn patients_by_email(&self, email: &str) -> Result<Vec<Patient>, AppError>;
    async fn patient_by_id(&self, id: i64) -> Result<Option<Patient>, AppError>;
    async fn create_patient(&self, patient: NewPatient) -> Result<Patient, AppError>;
    async fn count_patients(&self, clinic_id: Option<i64>) -> Result<u64, AppError>;

    // -- appointments -------------------------------------------------------
    async fn appointments_by_clinic(
        &self,
        clinic_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Appointment>, AppError>;
    async fn appointments_for_doctor(
        &self,
        clinic_id: i64,
        doctor_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Appointment>, AppError>;
    async fn appointments_for_patients(
        &self,
        patient_ids: &[i64],
    ) -> Result<Vec<Appointment>, AppError>;
    async fn appointment_by_id(&self, id: i64) -> Result<Option<Appointment>, AppError>;
    async fn create_appointment(&self, appt: NewAppointment) -> Result<Appointment, AppError>;
    async fn update_appointment_status(
        &self,
        id: i64,
        status: &str,
    ) -> Result<Appointment, AppError>;
    /// Marks every Checked In appointment for (clinic, patient, doctor) as
    /// Completed, returning how many rows changed.
    async fn complete_checked_in(
        &self,
        clinic_id: i64,
        patient_id: i64,
        doctor_id: i64,
    ) -> Result<u64, AppError>;

    // -- invoices -----------------------------------------------------------
    async fn invoices_by_clinic(&self, clinic_id: i64) -> Result<Vec<Invoice>, AppError>;
    async fn invoices_for_patients(&self, patient_ids: &[i64]) -> Result<Vec<Invoice>, AppError>;
    async fn create_invoice(&self, invoice: NewInvoice) -> Result<Invoice, AppError>;
    async fn update_invoice_status(&self, id: &str, status: &str) -> Result<Invoice, AppError>;
    async fn paid_invoice_total(&self, clinic_id: i64) -> Result<f64, AppError>;

    // -- service orders -----------------------------------------------------
    async fn orders_by_clinic(
        &self,
        clinic_id: i64,
        order_type: OrderType,
    ) -> Result<Vec<ServiceOrder>, AppError>;
    async fn order_by_id(&self, id: i64) -> Result<Option<ServiceOrder>, AppError>;
    async fn create_order(&self, order: NewServiceOrder) -> Result<ServiceOrder, AppError>;
    async fn update_order(&self, id: i64, patch: OrderPatch) -> Result<ServiceOrder, AppError>;

    // -- inventory ----------------------------------------------------------
    async fn inventory_by_clinic(&self, clinic_id: i64) -> Result<Vec<InventoryItem>, AppError>;
    async fn inventory_item(&self, id: i64) -> Result<Option<InventoryItem>, AppError>;
    async fn create_inventory_item(
        &self,
        item: NewInventoryItem,
    ) -> Result<InventoryItem, AppError>;
    async fn update_inventory_item(
        &self,
        id: i64,
        patch: InventoryPatch,
    ) -> Result<InventoryItem, AppError>;
    /// All-or-nothing stock deduction: either every line is satisfiable and
    /// every line is decremented, or nothing changes and the first short
    /// item's name comes back in `InsufficientStock`. This is the one place
    /// the gateway must be transactional.
    async fn deduct_stock(
        &self,
        clinic_id: i64,
        lines: &[StockLine],
    ) -> Result<Vec<InventoryItem>, AppError>;

    // -- notifications ------------------------------------------------------
    async fn notifications_by_clinic(&self, clinic_id: i64)
        -> Result<Vec<Notification>, AppError>;
    async fn recent_notifications(&self, limit: usize) -> Result<Vec<Notification>, AppError>;
    async fn create_notification(&self, n: NewNotification) -> Result<Notification, AppError>;
    async fn notification_by_id(&self, id: i64) -> Result<Option<Notification>, AppError>;
    async fn update_notification_status(
        &self,
        id: i64,
        status: &str,
    ) -> Result<Notification, AppError>;

    // -- medical records ----------------------------------------------------
    async fn create_record(&self, record: NewMedicalRecord) -> Result<MedicalRecord, AppError>;
    async fn records_for_patient(
        &self,
        clinic_id: i64,
        patient_id: i64,
    ) -> Result<Vec<MedicalRecord>, AppError>;
    async fn records_for_patients(
        &self,
        patient_ids: &[i64],
    ) -> Result<Vec<MedicalRecord>, AppError>;
    async fn records_for_doctor(
        &self,
        clinic_id: i64,
        doctor_id: i64,
    ) -> Result<Vec<MedicalRecord>, AppError>;
    async fn count_records(&self) -> Result<u64, AppError>;

    // -- form templates -----------------------------------------------------
    async fn templates_for_clinic(
        &self,
        clinic_id: i64,
        published_only: bool,
    ) -> Result<Vec<FormTemplate>, AppError>;
    async fn create_template(&self, template: NewFormTemplate)
        -> Result<FormTemplate, AppError>;
    async fn template_by_id(&self, id: i64) -> Result<Option<FormTemplate>, AppError>;
    async fn delete_template(&self, id: i64) -> Result<FormTemplate, AppError>;

    // -- departments --------------------------------------------------------
    async fn departments_by_clinic(&self, clinic_id: i64) -> Result<Vec<Department>, AppError>;
    async fn create_department(&self, department: NewDepartment)
        -> Result<Department, AppError>;
    async fn department_by_id(&self, id: i64) -> Result<Option<Department>, AppError>;
    async fn delete_department(&self, id: i64) -> Result<(), AppError>;

    // -- audit log ----------------------------------------------------------
    async fn append_audit(&self, entry: NewAuditEntry) -> Result<(), AppError>;
    async fn audit_for_clinic(
        &self,
        clinic_id: i64,
        limit: usize,
    ) -> Result<Vec<AuditEntry>, AppError>;
    async fn search_audit(&self, query: AuditQuery) -> Result<(Vec<AuditEntry>, u64), AppError>;
    async fn latest_audit_action(&self, action: &str) -> Result<Option<AuditEntry>, AppError>;

    // -- password resets ----------------------------------------------------
    async fn create_password_reset(&self, reset: PasswordReset) -> Result<(), AppError>;
    /// Consumes the reset row; a token can only be redeemed once.
    async fn take_password_reset(&self, token: Uuid) -> Result<Option<PasswordReset>, AppError>;
}
