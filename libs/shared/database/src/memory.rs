use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use shared_models::AppError;
use shared_models::{
    Appointment, AuditEntry, AuditQuery, Clinic, ClinicPatch, ClinicStaff, Department,
    FormTemplate, InventoryItem, InventoryPatch, Invoice, MedicalRecord, NewAppointment,
    NewAuditEntry, NewClinic, NewDepartment, NewFormTemplate, NewInventoryItem, NewInvoice,
    NewMedicalRecord, NewNotification, NewPatient, NewServiceOrder, NewStaff, NewUser,
    Notification, OrderPatch, OrderType, PasswordReset, Patient, ServiceOrder, StaffPatch,
    StockLine, User, UserPatch,
};

use crate::store::{page_window, Store};

#[derive(Default)]
struct Inner {
    seq: i64,
    users: Vec<User>,
    staff: Vec<ClinicStaff>,
    clinics: Vec<Clinic>,
    patients: Vec<Patient>,
    appointments: Vec<Appointment>,
    invoices: Vec<Invoice>,
    orders: Vec<ServiceOrder>,
    inventory: Vec<InventoryItem>,
    notifications: Vec<Notification>,
    records: Vec<MedicalRecord>,
    templates: Vec<FormTemplate>,
    departments: Vec<Department>,
    audit: Vec<AuditEntry>,
    resets: Vec<PasswordReset>,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.seq += 1;
        self.seq
    }
}

/// In-memory gateway used by tests and local development. A single lock
/// around the whole dataset makes every method, in particular
/// `deduct_stock`, atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A poisoned lock means a panicking test; propagating the panic is fine.
        self.inner.lock().expect("memory store lock poisoned")
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl Store for MemoryStore {
    // -- users --------------------------------------------------------------

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut inner = self.lock();
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(format!(
                "A user with email {} already exists",
                user.email
            )));
        }
        let id = inner.next_id();
        let created = User {
            id,
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            phone: user.phone,
            role: user.role,
            status: "active".to_string(),
            failed_login_attempts: 0,
            lockout_until: None,
            joined: Utc::now(),
        };
        inner.users.push(created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> Result<User, AppError> {
        let mut inner = self.lock();
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(phone) = patch.phone {
            user.phone = Some(phone);
        }
        if let Some(status) = patch.status {
            user.status = status;
        }
        if let Some(hash) = patch.password_hash {
            user.password_hash = hash;
        }
        if let Some(attempts) = patch.failed_login_attempts {
            user.failed_login_attempts = attempts;
        }
        if let Some(lockout) = patch.lockout_until {
            user.lockout_until = lockout;
        }
        Ok(user.clone())
    }

    // -- clinic staff -------------------------------------------------------

    async fn staff_for_user(&self, user_id: i64) -> Result<Vec<ClinicStaff>, AppError> {
        Ok(self
            .lock()
            .staff
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn staff_for_clinic(&self, clinic_id: i64) -> Result<Vec<ClinicStaff>, AppError> {
        Ok(self
            .lock()
            .staff
            .iter()
            .filter(|s| s.clinic_id == clinic_id)
            .cloned()
            .collect())
    }

    async fn all_staff(&self) -> Result<Vec<ClinicStaff>, AppError> {
        Ok(self.lock().staff.clone())
    }

    async fn membership(
        &self,
        user_id: i64,
        clinic_id: i64,
    ) -> Result<Option<ClinicStaff>, AppError> {
        Ok(self
            .lock()
            .staff
            .iter()
            .find(|s| s.user_id == user_id && s.clinic_id == clinic_id)
            .cloned())
    }

    async fn staff_by_id(&self, id: i64) -> Result<Option<ClinicStaff>, AppError> {
        Ok(self.lock().staff.iter().find(|s| s.id == id).cloned())
    }

    async fn create_staff(&self, staff: NewStaff) -> Result<ClinicStaff, AppError> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let created = ClinicStaff {
            id,
            user_id: staff.user_id,
            clinic_id: staff.clinic_id,
            role: staff.role,
            department: staff.department,
            specialty: staff.specialty,
            created_at: Utc::now(),
        };
        inner.staff.push(created.clone());
        Ok(created)
    }

    async fn update_staff(&self, id: i64, patch: StaffPatch) -> Result<ClinicStaff, AppError> {
        let mut inner = self.lock();
        let staff = inner
            .staff
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| AppError::NotFound("Staff record not found".to_string()))?;
        if let Some(role) = patch.role {
            staff.role = role;
        }
        if let Some(department) = patch.department {
            staff.department = Some(department);
        }
        if let Some(specialty) = patch.specialty {
            staff.specialty = Some(specialty);
        }
        Ok(staff.clone())
    }

    async fn delete_staff(&self, id: i64) -> Result<(), AppError> {
        let mut inner = self.lock();
        let before = inner.staff.len();
        inner.staff.retain(|s| s.id != id);
        if inner.staff.len() == before {
            return Err(AppError::NotFound("Staff record not found".to_string()));
        }
        Ok(())
    }

    // -- clinics ------------------------------------------------------------

    async fn clinic_by_id(&self, id: i64) -> Result<Option<Clinic>, AppError> {
        Ok(self.lock().clinics.iter().find(|c| c.id == id).cloned())
    }

    async fn clinic_by_subdomain(&self, subdomain: &str) -> Result<Option<Clinic>, AppError> {
        Ok(self
            .lock()
            .clinics
            .iter()
            .find(|c| c.subdomain == subdomain)
            .cloned())
    }

    async fn list_clinics(&self) -> Result<Vec<Clinic>, AppError> {
        Ok(self.lock().clinics.clone())
    }

    async fn create_clinic(&self, clinic: NewClinic) -> Result<Clinic, AppError> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let created = Clinic {
            id,
            name: clinic.name,
            subdomain: clinic.subdomain,
            location: clinic.location,
            email: clinic.email,
            contact: clinic.contact,
            status: "active".to_string(),
            modules: clinic.modules,
            booking_config: None,
            subscription_starts: Some(Utc::now()),
            subscription_ends: None,
            created_at: Utc::now(),
        };
        inner.clinics.push(created.clone());
        Ok(created)
    }

    async fn update_clinic(&self, id: i64, patch: ClinicPatch) -> Result<Clinic, AppError> {
        let mut inner = self.lock();
        let clinic = inner
            .clinics
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound("Clinic not found".to_string()))?;
        if let Some(name) = patch.name {
            clinic.name = name;
        }
        if let Some(location) = patch.location {
            clinic.location = Some(location);
        }
        if let Some(email) = patch.email {
            clinic.email = Some(email);
        }
        if let Some(contact) = patch.contact {
            clinic.contact = Some(contact);
        }
        if let Some(status) = patch.status {
            clinic.status = status;
        }
        if let Some(modules) = patch.modules {
            clinic.modules = modules;
        }
        if let Some(config) = patch.booking_config {
            clinic.booking_config = Some(config);
        }
        Ok(clinic.clone())
    }

    async fn delete_clinic(&self, id: i64) -> Result<(), AppError> {
        let mut inner = self.lock();
        let before = inner.clinics.len();
        inner.clinics.retain(|c| c.id != id);
        if inner.clinics.len() == before {
            return Err(AppError::NotFound("Clinic not found".to_string()));
        }
        Ok(())
    }

    async fn count_clinics(&self) -> Result<u64, AppError> {
        Ok(self.lock().clinics.len() as u64)
    }

    // -- patients -----------------------------------------------------------

    async fn patients_by_clinic(
        &self,
        clinic_id: i64,
        search: Option<&str>,
    ) -> Result<Vec<Patient>, AppError> {
        Ok(self
            .lock()
            .patients
            .iter()
            .filter(|p| p.clinic_id == clinic_id)
            .filter(|p| match search {
                Some(term) => {
                    contains_ci(&p.name, term)
                        || p.phone.as_deref().is_some_and(|v| contains_ci(v, term))
                        || contains_ci(&p.mrn, term)
                }
                None => true,
            })
            .cloned()
            .collect())
    }

    async fn patients_by_email(&self, email: &str) -> Result<Vec<Patient>, AppError> {
        Ok(self
            .lock()
            .patients
            .iter()
            .filter(|p| p.email.as_deref() == Some(email))
            .cloned()
            .collect())
    }

    async fn patient_by_id(&self, id: i64) -> Result<Option<Patient>, AppError> {
        Ok(self.lock().patients.iter().find(|p| p.id == id).cloned())
    }

    async fn create_patient(&self, patient: NewPatient) -> Result<Patient, AppError> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let created = Patient {
            id,
            clinic_id: patient.clinic_id,
            mrn: patient.mrn,
            name: patient.name,
            phone: patient.phone,
            email: patient.email,
            gender: patient.gender,
            address: patient.address,
            medical_history: patient.medical_history,
            status: patient.status,
            created_year: Utc::now().format("%Y").to_string().parse().unwrap_or(0),
            created_at: Utc::now(),
        };
        inner.patients.push(created.clone());
        Ok(created)
    }

    async fn count_patients(&self, clinic_id: Option<i64>) -> Result<u64, AppError> {
        Ok(self
            .lock()
            .patients
            .iter()
            .filter(|p| clinic_id.is_none_or(|c| p.clinic_id == c))
            .count() as u64)
    }

    // -- appointments -------------------------------------------------------

    async fn appointments_by_clinic(
        &self,
        clinic_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Appointment>, AppError> {
        Ok(self
            .lock()
            .appointments
            .iter()
            .filter(|a| a.clinic_id == clinic_id)
            .filter(|a| date.is_none_or(|d| a.date == d))
            .cloned()
            .collect())
    }

    async fn appointments_for_doctor(
        &self,
        clinic_id: i64,
        doctor_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Appointment>, AppError> {
        Ok(self
            .lock()
            .appointments
            .iter()
            .filter(|a| a.clinic_id == clinic_id && a.doctor_id == doctor_id)
            .filter(|a| date.is_none_or(|d| a.date == d))
            .cloned()
            .collect())
    }

    async fn appointments_for_patients(
        &self,
        patient_ids: &[i64],
    ) -> Result<Vec<Appointment>, AppError> {
        Ok(self
            .lock()
            .appointments
            .iter()
            .filter(|a| patient_ids.contains(&a.patient_id))
            .cloned()
            .collect())
    }

    async fn appointment_by_id(&self, id: i64) -> Result<Option<Appointment>, AppError> {
        Ok(self
            .lock()
            .appointments
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn create_appointment(&self, appt: NewAppointment) -> Result<Appointment, AppError> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let created = Appointment {
            id,
            clinic_id: appt.clinic_id,
            patient_id: appt.patient_id,
            doctor_id: appt.doctor_id,
            date: appt.date,
            time: appt.time,
            status: appt.status,
            source: appt.source,
            fees: appt.fees,
            notes: appt.notes,
            created_at: Utc::now(),
        };
        inner.appointments.push(created.clone());
        Ok(created)
    }

    async fn update_appointment_status(
        &self,
        id: i64,
        status: &str,
    ) -> Result<Appointment, AppError> {
        let mut inner = self.lock();
        let appt = inner
            .appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))?;
        appt.status = status.to_string();
        Ok(appt.clone())
    }

    async fn complete_checked_in(
        &self,
        clinic_id: i64,
        patient_id: i64,
        doctor_id: i64,
    ) -> Result<u64, AppError> {
        let mut inner = self.lock();
        let mut changed = 0;
        for appt in inner.appointments.iter_mut() {
            if appt.clinic_id == clinic_id
                && appt.patient_id == patient_id
                && appt.doctor_id == doctor_id
                && appt.status == "Checked In"
            {
                appt.status = "Completed".to_string();
                changed += 1;
            }
        }
        Ok(changed)
    }

    // -- invoices -----------------------------------------------------------

    async fn invoices_by_clinic(&self, clinic_id: i64) -> Result<Vec<Invoice>, AppError> {
        let mut invoices: Vec<Invoice> = self
            .lock()
            .invoices
            .iter()
            .filter(|i| i.clinic_id == clinic_id)
            .cloned()
            .collect();
        invoices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(invoices)
    }

    async fn invoices_for_patients(&self, patient_ids: &[i64]) -> Result<Vec<Invoice>, AppError> {
        Ok(self
            .lock()
            .invoices
            .iter()
            .filter(|i| patient_ids.contains(&i.patient_id))
            .cloned()
            .collect())
    }

    async fn create_invoice(&self, invoice: NewInvoice) -> Result<Invoice, AppError> {
        let mut inner = self.lock();
        let created = Invoice {
            id: invoice.id,
            clinic_id: invoice.clinic_id,
            patient_id: invoice.patient_id,
            doctor_id: invoice.doctor_id,
            service: invoice.service,
            amount: invoice.amount,
            status: invoice.status,
            created_at: Utc::now(),
        };
        inner.invoices.push(created.clone());
        Ok(created)
    }

    async fn update_invoice_status(&self, id: &str, status: &str) -> Result<Invoice, AppError> {
        let mut inner = self.lock();
        let invoice = inner
            .invoices
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| AppError::NotFound("Invoice not found".to_string()))?;
        invoice.status = status.to_string();
        Ok(invoice.clone())
    }

    async fn paid_invoice_total(&self, clinic_id: i64) -> Result<f64, AppError> {
        Ok(self
            .lock()
            .invoices
            .iter()
            .filter(|i| i.clinic_id == clinic_id && i.status == "Paid")
            .map(|i| i.amount)
            .sum())
    }

    // -- service orders -----------------------------------------------------

    async fn orders_by_clinic(
        &self,
        clinic_id: i64,
        order_type: OrderType,
    ) -> Result<Vec<ServiceOrder>, AppError> {
        let mut orders: Vec<ServiceOrder> = self
            .lock()
            .orders
            .iter()
            .filter(|o| o.clinic_id == clinic_id && o.order_type == order_type)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn order_by_id(&self, id: i64) -> Result<Option<ServiceOrder>, AppError> {
        Ok(self.lock().orders.iter().find(|o| o.id == id).cloned())
    }

    async fn create_order(&self, order: NewServiceOrder) -> Result<ServiceOrder, AppError> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let created = ServiceOrder {
            id,
            clinic_id: order.clinic_id,
            patient_id: order.patient_id,
            doctor_id: order.doctor_id,
            order_type: order.order_type,
            test_name: order.test_name,
            details: order.details,
            status: "Ordered".to_string(),
            result: None,
            created_at: Utc::now(),
        };
        inner.orders.push(created.clone());
        Ok(created)
    }

    async fn update_order(&self, id: i64, patch: OrderPatch) -> Result<ServiceOrder, AppError> {
        let mut inner = self.lock();
        let order = inner
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        if let Some(status) = patch.status {
            order.status = status;
        }
        if let Some(result) = patch.result {
            order.result = Some(result);
        }
        Ok(order.clone())
    }

    // -- inventory ----------------------------------------------------------

    async fn inventory_by_clinic(&self, clinic_id: i64) -> Result<Vec<InventoryItem>, AppError> {
        let mut items: Vec<InventoryItem> = self
            .lock()
            .inventory
            .iter()
            .filter(|i| i.clinic_id == clinic_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn inventory_item(&self, id: i64) -> Result<Option<InventoryItem>, AppError> {
        Ok(self.lock().inventory.iter().find(|i| i.id == id).cloned())
    }

    async fn create_inventory_item(
        &self,
        item: NewInventoryItem,
    ) -> Result<InventoryItem, AppError> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let created = InventoryItem {
            id,
            clinic_id: item.clinic_id,
            name: item.name,
            sku: item.sku,
            quantity: item.quantity,
            unit_price: item.unit_price,
            expiry_date: item.expiry_date,
            created_at: Utc::now(),
        };
        inner.inventory.push(created.clone());
        Ok(created)
    }

    async fn update_inventory_item(
        &self,
        id: i64,
        patch: InventoryPatch,
    ) -> Result<InventoryItem, AppError> {
        let mut inner = self.lock();
        let item = inner
            .inventory
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| AppError::NotFound("Inventory item not found".to_string()))?;
        if let Some(name) = patch.name {
            item.name = name;
        }
        if let Some(sku) = patch.sku {
            item.sku = sku;
        }
        if let Some(quantity) = patch.quantity {
            item.quantity = quantity;
        }
        if let Some(unit_price) = patch.unit_price {
            item.unit_price = unit_price;
        }
        if let Some(expiry) = patch.expiry_date {
            item.expiry_date = Some(expiry);
        }
        Ok(item.clone())
    }

    async fn deduct_stock(
        &self,
        clinic_id: i64,
        lines: &[StockLine],
    ) -> Result<Vec<InventoryItem>, AppError> {
        let mut inner = self.lock();

        // Check every line before touching anything.
        for line in lines {
            let item = inner
                .inventory
                .iter()
                .find(|i| i.id == line.inventory_id && i.clinic_id == clinic_id)
                .ok_or_else(|| AppError::InsufficientStock("Item".to_string()))?;
            if item.quantity < line.quantity {
                return Err(AppError::InsufficientStock(item.name.clone()));
            }
        }

        let mut updated = Vec::with_capacity(lines.len());
        for line in lines {
            let item = inner
                .inventory
                .iter_mut()
                .find(|i| i.id == line.inventory_id && i.clinic_id == clinic_id)
                .expect("checked above");
            item.quantity -= line.quantity;
            updated.push(item.clone());
        }
        Ok(updated)
    }

    // -- notifications ------------------------------------------------------

    async fn notifications_by_clinic(
        &self,
        clinic_id: i64,
    ) -> Result<Vec<Notification>, AppError> {
        let mut notifications: Vec<Notification> = self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.clinic_id == clinic_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notifications)
    }

    async fn recent_notifications(&self, limit: usize) -> Result<Vec<Notification>, AppError> {
        let mut notifications = self.lock().notifications.clone();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications.truncate(limit);
        Ok(notifications)
    }

    async fn create_notification(&self, n: NewNotification) -> Result<Notification, AppError> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let created = Notification {
            id,
            clinic_id: n.clinic_id,
            department: n.department,
            message: n.message,
            status: "unread".to_string(),
            created_at: Utc::now(),
        };
        inner.notifications.push(created.clone());
        Ok(created)
    }

    async fn notification_by_id(&self, id: i64) -> Result<Option<Notification>, AppError> {
        Ok(self.lock().notifications.iter().find(|n| n.id == id).cloned())
    }

    async fn update_notification_status(
        &self,
        id: i64,
        status: &str,
    ) -> Result<Notification, AppError> {
        let mut inner = self.lock();
        let notification = inner
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;
        notification.status = status.to_string();
        Ok(notification.clone())
    }

    // -- medical records ----------------------------------------------------

    async fn create_record(&self, record: NewMedicalRecord) -> Result<MedicalRecord, AppError> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let created = MedicalRecord {
            id,
            clinic_id: record.clinic_id,
            patient_id: record.patient_id,
            doctor_id: record.doctor_id,
            template_id: record.template_id,
            record_type: record.record_type,
            data: record.data,
            is_closed: record.is_closed,
            created_at: Utc::now(),
        };
        inner.records.push(created.clone());
        Ok(created)
    }

    async fn records_for_patient(
        &self,
        clinic_id: i64,
        patient_id: i64,
    ) -> Result<Vec<MedicalRecord>, AppError> {
        let mut records: Vec<MedicalRecord> = self
            .lock()
            .records
            .iter()
            .filter(|r| r.clinic_id == clinic_id && r.patient_id == patient_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn records_for_patients(
        &self,
        patient_ids: &[i64],
    ) -> Result<Vec<MedicalRecord>, AppError> {
        Ok(self
            .lock()
            .records
            .iter()
            .filter(|r| patient_ids.contains(&r.patient_id))
            .cloned()
            .collect())
    }

    async fn records_for_doctor(
        &self,
        clinic_id: i64,
        doctor_id: i64,
    ) -> Result<Vec<MedicalRecord>, AppError> {
        let mut records: Vec<MedicalRecord> = self
            .lock()
            .records
            .iter()
            .filter(|r| r.clinic_id == clinic_id && r.doctor_id == doctor_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn count_records(&self) -> Result<u64, AppError> {
        Ok(self.lock().records.len() as u64)
    }

    // -- form templates -----------------------------------------------------

    async fn templates_for_clinic(
        &self,
        clinic_id: i64,
        published_only: bool,
    ) -> Result<Vec<FormTemplate>, AppError> {
        let mut templates: Vec<FormTemplate> = self
            .lock()
            .templates
            .iter()
            .filter(|t| t.clinic_id.is_none() || t.clinic_id == Some(clinic_id))
            .filter(|t| !published_only || t.status == "published")
            .cloned()
            .collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    async fn create_template(
        &self,
        template: NewFormTemplate,
    ) -> Result<FormTemplate, AppError> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let created = FormTemplate {
            id,
            clinic_id: template.clinic_id,
            name: template.name,
            specialty: template.specialty,
            fields: template.fields,
            status: template.status,
            created_at: Utc::now(),
        };
        inner.templates.push(created.clone());
        Ok(created)
    }

    async fn template_by_id(&self, id: i64) -> Result<Option<FormTemplate>, AppError> {
        Ok(self.lock().templates.iter().find(|t| t.id == id).cloned())
    }

    async fn delete_template(&self, id: i64) -> Result<FormTemplate, AppError> {
        let mut inner = self.lock();
        let index = inner
            .templates
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| AppError::NotFound("Form template not found".to_string()))?;
        Ok(inner.templates.remove(index))
    }

    // -- departments --------------------------------------------------------

    async fn departments_by_clinic(&self, clinic_id: i64) -> Result<Vec<Department>, AppError> {
        let mut departments: Vec<Department> = self
            .lock()
            .departments
            .iter()
            .filter(|d| d.clinic_id == clinic_id)
            .cloned()
            .collect();
        departments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(departments)
    }

    async fn create_department(
        &self,
        department: NewDepartment,
    ) -> Result<Department, AppError> {
        let mut inner = self.lock();
        let id = inner.next_id();
        let created = Department {
            id,
            clinic_id: department.clinic_id,
            name: department.name,
            kind: department.kind,
        };
        inner.departments.push(created.clone());
        Ok(created)
    }

    async fn department_by_id(&self, id: i64) -> Result<Option<Department>, AppError> {
        Ok(self.lock().departments.iter().find(|d| d.id == id).cloned())
    }

    async fn delete_department(&self, id: i64) -> Result<(), AppError> {
        let mut inner = self.lock();
        let before = inner.departments.len();
        inner.departments.retain(|d| d.id != id);
        if inner.departments.len() == before {
            return Err(AppError::NotFound("Department not found".to_string()));
        }
        Ok(())
    }

    // -- audit log ----------------------------------------------------------

    async fn append_audit(&self, entry: NewAuditEntry) -> Result<(), AppError> {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.audit.push(AuditEntry {
            id,
            action: entry.action,
            performed_by: entry.performed_by,
            user_id: entry.user_id,
            clinic_id: entry.clinic_id,
            ip: entry.ip,
            device: entry.device,
            details: entry.details,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn audit_for_clinic(
        &self,
        clinic_id: i64,
        limit: usize,
    ) -> Result<Vec<AuditEntry>, AppError> {
        let mut entries: Vec<AuditEntry> = self
            .lock()
            .audit
            .iter()
            .filter(|e| e.clinic_id == Some(clinic_id))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn search_audit(&self, query: AuditQuery) -> Result<(Vec<AuditEntry>, u64), AppError> {
        let mut entries: Vec<AuditEntry> = self
            .lock()
            .audit
            .iter()
            .filter(|e| match &query.search {
                Some(term) => contains_ci(&e.action, term) || contains_ci(&e.performed_by, term),
                None => true,
            })
            .filter(|e| match &query.action {
                Some(action) if action != "all" => contains_ci(&e.action, action),
                _ => true,
            })
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        let total = entries.len() as u64;
        let (limit, offset) = page_window(query.page, query.limit);
        let entries = entries
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((entries, total))
    }

    async fn latest_audit_action(&self, action: &str) -> Result<Option<AuditEntry>, AppError> {
        Ok(self
            .lock()
            .audit
            .iter()
            .filter(|e| e.action == action)
            .max_by_key(|e| e.timestamp)
            .cloned())
    }

    // -- password resets ----------------------------------------------------

    async fn create_password_reset(&self, reset: PasswordReset) -> Result<(), AppError> {
        self.lock().resets.push(reset);
        Ok(())
    }

    async fn take_password_reset(&self, token: Uuid) -> Result<Option<PasswordReset>, AppError> {
        let mut inner = self.lock();
        let index = inner.resets.iter().position(|r| r.token == token);
        Ok(index.map(|i| inner.resets.remove(i)))
    }
}
