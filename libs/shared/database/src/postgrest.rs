use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, Response,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
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

/// PostgREST-backed gateway. Every table access goes through the generic
/// `request` helper; mutations send `Prefer: return=representation` so the
/// affected rows come back without a second round trip.
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.postgrest_url.clone(),
            api_key: config.postgrest_api_key.clone(),
        }
    }

    fn headers(&self, representation: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(key) = HeaderValue::from_str(&self.api_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.api_key)) {
            headers.insert(AUTHORIZATION, bearer);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if representation {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }
        headers
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        representation: bool,
    ) -> Result<Response, AppError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "postgrest request");

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.headers(representation));
        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req
            .send()
            .await
            .map_err(|e| AppError::Database(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(%status, %text, "postgrest error");
            if let Some(item) = insufficient_stock_item(&text) {
                return Err(AppError::InsufficientStock(item));
            }
            return Err(AppError::Database(format!(
                "postgrest error ({}): {}",
                status,
                text
            )));
        }
        Ok(response)
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        representation: bool,
    ) -> Result<T, AppError> {
        let response = self.send(method, path, body, representation).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| AppError::Database(format!("decoding response: {}", e)))
    }

    async fn select<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, AppError> {
        self.request(Method::GET, path, None, false).await
    }

    async fn select_one<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, AppError> {
        let mut rows: Vec<T> = self.select(path).await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }

    async fn insert<T: DeserializeOwned>(&self, table: &str, body: Value) -> Result<T, AppError> {
        let path = format!("/rest/v1/{}", table);
        let mut rows: Vec<T> = self.request(Method::POST, &path, Some(body), true).await?;
        if rows.is_empty() {
            return Err(AppError::Database(format!(
                "insert into {} returned no rows",
                table
            )));
        }
        Ok(rows.remove(0))
    }

    async fn patch_one<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Value,
        missing: &str,
    ) -> Result<T, AppError> {
        let mut rows: Vec<T> = self.request(Method::PATCH, path, Some(body), true).await?;
        if rows.is_empty() {
            return Err(AppError::NotFound(missing.to_string()));
        }
        Ok(rows.remove(0))
    }

    async fn delete_rows(&self, path: &str, missing: &str) -> Result<(), AppError> {
        let rows: Vec<Value> = self.request(Method::DELETE, path, None, true).await?;
        if rows.is_empty() {
            return Err(AppError::NotFound(missing.to_string()));
        }
        Ok(())
    }

    async fn count(&self, path: &str) -> Result<u64, AppError> {
        let response = self.send(Method::HEAD, path, None, false).await?;
        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit('/').next())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        Ok(total)
    }

    async fn count_with_rows<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<(Vec<T>, u64), AppError> {
        let url = format!("{}{}", self.base_url, path);
        let mut headers = self.headers(false);
        headers.insert("Prefer", HeaderValue::from_static("count=exact"));
        let response = self
            .client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| AppError::Database(format!("request to {} failed: {}", url, e)))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Database(format!(
                "postgrest error ({}): {}",
                status,
                text
            )));
        }
        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit('/').next())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        let rows = response
            .json::<Vec<T>>()
            .await
            .map_err(|e| AppError::Database(format!("decoding response: {}", e)))?;
        Ok((rows, total))
    }
}

/// PostgREST percent-encodes nothing for us; search terms go inside an
/// `ilike.*term*` pattern, so the reserved characters must be escaped.
fn encode(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for byte in term.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// The `deduct_stock` database function raises
/// `insufficient stock: <item name>` when any requested line cannot be
/// satisfied, and the whole transaction rolls back.
fn insufficient_stock_item(error_text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(error_text).ok()?;
    let message = value.get("message")?.as_str()?;
    message
        .strip_prefix("insufficient stock: ")
        .map(|item| item.to_string())
}

#[async_trait]
impl Store for RestStore {
    // -- users --------------------------------------------------------------

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.select_one(&format!("/rest/v1/users?email=eq.{}", encode(email)))
            .await
    }

    async fn user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        self.select_one(&format!("/rest/v1/users?id=eq.{}", id)).await
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        self.insert(
            "users",
            json!({
                "email": user.email,
                "password_hash": user.password_hash,
                "name": user.name,
                "phone": user.phone,
                "role": user.role,
                "status": "active",
            }),
        )
        .await
    }

    async fn update_user(&self, id: i64, patch: UserPatch) -> Result<User, AppError> {
        let mut body = serde_json::Map::new();
        if let Some(name) = patch.name {
            body.insert("name".into(), json!(name));
        }
        if let Some(email) = patch.email {
            body.insert("email".into(), json!(email));
        }
        if let Some(phone) = patch.phone {
            body.insert("phone".into(), json!(phone));
        }
        if let Some(status) = patch.status {
            body.insert("status".into(), json!(status));
        }
        if let Some(hash) = patch.password_hash {
            body.insert("password_hash".into(), json!(hash));
        }
        if let Some(attempts) = patch.failed_login_attempts {
            body.insert("failed_login_attempts".into(), json!(attempts));
        }
        if let Some(lockout) = patch.lockout_until {
            body.insert("lockout_until".into(), json!(lockout));
        }
        self.patch_one(
            &format!("/rest/v1/users?id=eq.{}", id),
            Value::Object(body),
            "User not found",
        )
        .await
    }

    // -- clinic staff -------------------------------------------------------

    async fn staff_for_user(&self, user_id: i64) -> Result<Vec<ClinicStaff>, AppError> {
        self.select(&format!("/rest/v1/clinic_staff?user_id=eq.{}", user_id))
            .await
    }

    async fn staff_for_clinic(&self, clinic_id: i64) -> Result<Vec<ClinicStaff>, AppError> {
        self.select(&format!("/rest/v1/clinic_staff?clinic_id=eq.{}", clinic_id))
            .await
    }

    async fn all_staff(&self) -> Result<Vec<ClinicStaff>, AppError> {
        self.select("/rest/v1/clinic_staff").await
    }

    async fn membership(
        &self,
        user_id: i64,
        clinic_id: i64,
    ) -> Result<Option<ClinicStaff>, AppError> {
        self.select_one(&format!(
            "/rest/v1/clinic_staff?user_id=eq.{}&clinic_id=eq.{}",
            user_id, clinic_id
        ))
        .await
    }

    async fn staff_by_id(&self, id: i64) -> Result<Option<ClinicStaff>, AppError> {
        self.select_one(&format!("/rest/v1/clinic_staff?id=eq.{}", id))
            .await
    }

    async fn create_staff(&self, staff: NewStaff) -> Result<ClinicStaff, AppError> {
        self.insert(
            "clinic_staff",
            json!({
                "user_id": staff.user_id,
                "clinic_id": staff.clinic_id,
                "role": staff.role,
                "department": staff.department,
                "specialty": staff.specialty,
            }),
        )
        .await
    }

    async fn update_staff(&self, id: i64, patch: StaffPatch) -> Result<ClinicStaff, AppError> {
        let mut body = serde_json::Map::new();
        if let Some(role) = patch.role {
            body.insert("role".into(), json!(role));
        }
        if let Some(department) = patch.department {
            body.insert("department".into(), json!(department));
        }
        if let Some(specialty) = patch.specialty {
            body.insert("specialty".into(), json!(specialty));
        }
        self.patch_one(
            &format!("/rest/v1/clinic_staff?id=eq.{}", id),
            Value::Object(body),
            "Staff record not found",
        )
        .await
    }

    async fn delete_staff(&self, id: i64) -> Result<(), AppError> {
        self.delete_rows(
            &format!("/rest/v1/clinic_staff?id=eq.{}", id),
            "Staff record not found",
        )
        .await
    }

    // -- clinics ------------------------------------------------------------

    async fn clinic_by_id(&self, id: i64) -> Result<Option<Clinic>, AppError> {
        self.select_one(&format!("/rest/v1/clinics?id=eq.{}", id)).await
    }

    async fn clinic_by_subdomain(&self, subdomain: &str) -> Result<Option<Clinic>, AppError> {
        self.select_one(&format!(
            "/rest/v1/clinics?subdomain=eq.{}",
            encode(subdomain)
        ))
        .await
    }

    async fn list_clinics(&self) -> Result<Vec<Clinic>, AppError> {
        self.select("/rest/v1/clinics?order=created_at.desc").await
    }

    async fn create_clinic(&self, clinic: NewClinic) -> Result<Clinic, AppError> {
        self.insert(
            "clinics",
            json!({
                "name": clinic.name,
                "subdomain": clinic.subdomain,
                "location": clinic.location,
                "email": clinic.email,
                "contact": clinic.contact,
                "modules": clinic.modules,
                "status": "active",
            }),
        )
        .await
    }

    async fn update_clinic(&self, id: i64, patch: ClinicPatch) -> Result<Clinic, AppError> {
        let mut body = serde_json::Map::new();
        if let Some(name) = patch.name {
            body.insert("name".into(), json!(name));
        }
        if let Some(location) = patch.location {
            body.insert("location".into(), json!(location));
        }
        if let Some(email) = patch.email {
            body.insert("email".into(), json!(email));
        }
        if let Some(contact) = patch.contact {
            body.insert("contact".into(), json!(contact));
        }
        if let Some(status) = patch.status {
            body.insert("status".into(), json!(status));
        }
        if let Some(modules) = patch.modules {
            body.insert("modules".into(), json!(modules));
        }
        if let Some(config) = patch.booking_config {
            body.insert("booking_config".into(), json!(config));
        }
        self.patch_one(
            &format!("/rest/v1/clinics?id=eq.{}", id),
            Value::Object(body),
            "Clinic not found",
        )
        .await
    }

    async fn delete_clinic(&self, id: i64) -> Result<(), AppError> {
        self.delete_rows(&format!("/rest/v1/clinics?id=eq.{}", id), "Clinic not found")
            .await
    }

    async fn count_clinics(&self) -> Result<u64, AppError> {
        self.count("/rest/v1/clinics?select=id").await
    }

    // -- patients -----------------------------------------------------------

    async fn patients_by_clinic(
        &self,
        clinic_id: i64,
        search: Option<&str>,
    ) -> Result<Vec<Patient>, AppError> {
        let mut path = format!(
            "/rest/v1/patients?clinic_id=eq.{}&order=created_at.desc",
            clinic_id
        );
        if let Some(term) = search {
            let pattern = encode(&format!("*{}*", term));
            path.push_str(&format!(
                "&or=(name.ilike.{p},phone.ilike.{p},mrn.ilike.{p})",
                p = pattern
            ));
        }
        self.select(&path).await
    }

    async fn patients_by_email(&self, email: &str) -> Result<Vec<Patient>, AppError> {
        self.select(&format!("/rest/v1/patients?email=eq.{}", encode(email)))
            .await
    }

    async fn patient_by_id(&self, id: i64) -> Result<Option<Patient>, AppError> {
        self.select_one(&format!("/rest/v1/patients?id=eq.{}", id)).await
    }

    async fn create_patient(&self, patient: NewPatient) -> Result<Patient, AppError> {
        self.insert(
            "patients",
            json!({
                "clinic_id": patient.clinic_id,
                "mrn": patient.mrn,
                "name": patient.name,
                "phone": patient.phone,
                "email": patient.email,
                "gender": patient.gender,
                "address": patient.address,
                "medical_history": patient.medical_history,
                "status": patient.status,
            }),
        )
        .await
    }

    async fn count_patients(&self, clinic_id: Option<i64>) -> Result<u64, AppError> {
        let path = match clinic_id {
            Some(id) => format!("/rest/v1/patients?select=id&clinic_id=eq.{}", id),
            None => "/rest/v1/patients?select=id".to_string(),
        };
        self.count(&path).await
    }

    // -- appointments -------------------------------------------------------

    async fn appointments_by_clinic(
        &self,
        clinic_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Appointment>, AppError> {
        let mut path = format!(
            "/rest/v1/appointments?clinic_id=eq.{}&order=created_at.desc",
            clinic_id
        );
        if let Some(date) = date {
            path.push_str(&format!("&date=eq.{}", date));
        }
        self.select(&path).await
    }

    async fn appointments_for_doctor(
        &self,
        clinic_id: i64,
        doctor_id: i64,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Appointment>, AppError> {
        let mut path = format!(
            "/rest/v1/appointments?clinic_id=eq.{}&doctor_id=eq.{}",
            clinic_id, doctor_id
        );
        if let Some(date) = date {
            path.push_str(&format!("&date=eq.{}", date));
        }
        self.select(&path).await
    }

    async fn appointments_for_patients(
        &self,
        patient_ids: &[i64],
    ) -> Result<Vec<Appointment>, AppError> {
        if patient_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = patient_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.select(&format!(
            "/rest/v1/appointments?patient_id=in.({})&order=date.desc",
            ids
        ))
        .await
    }

    async fn appointment_by_id(&self, id: i64) -> Result<Option<Appointment>, AppError> {
        self.select_one(&format!("/rest/v1/appointments?id=eq.{}", id))
            .await
    }

    async fn create_appointment(&self, appt: NewAppointment) -> Result<Appointment, AppError> {
        self.insert(
            "appointments",
            json!({
                "clinic_id": appt.clinic_id,
                "patient_id": appt.patient_id,
                "doctor_id": appt.doctor_id,
                "date": appt.date,
                "time": appt.time,
                "status": appt.status,
                "source": appt.source,
                "fees": appt.fees,
                "notes": appt.notes,
            }),
        )
        .await
    }

    async fn update_appointment_status(
        &self,
        id: i64,
        status: &str,
    ) -> Result<Appointment, AppError> {
        self.patch_one(
            &format!("/rest/v1/appointments?id=eq.{}", id),
            json!({ "status": status }),
            "Appointment not found",
        )
        .await
    }

    async fn complete_checked_in(
        &self,
        clinic_id: i64,
        patient_id: i64,
        doctor_id: i64,
    ) -> Result<u64, AppError> {
        let path = format!(
            "/rest/v1/appointments?clinic_id=eq.{}&patient_id=eq.{}&doctor_id=eq.{}&status=eq.Checked%20In",
            clinic_id, patient_id, doctor_id
        );
        let rows: Vec<Value> = self
            .request(
                Method::PATCH,
                &path,
                Some(json!({ "status": "Completed" })),
                true,
            )
            .await?;
        Ok(rows.len() as u64)
    }

    // -- invoices -----------------------------------------------------------

    async fn invoices_by_clinic(&self, clinic_id: i64) -> Result<Vec<Invoice>, AppError> {
        self.select(&format!(
            "/rest/v1/invoices?clinic_id=eq.{}&order=created_at.desc",
            clinic_id
        ))
        .await
    }

    async fn invoices_for_patients(&self, patient_ids: &[i64]) -> Result<Vec<Invoice>, AppError> {
        if patient_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = patient_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.select(&format!(
            "/rest/v1/invoices?patient_id=in.({})&order=created_at.desc",
            ids
        ))
        .await
    }

    async fn create_invoice(&self, invoice: NewInvoice) -> Result<Invoice, AppError> {
        self.insert(
            "invoices",
            json!({
                "id": invoice.id,
                "clinic_id": invoice.clinic_id,
                "patient_id": invoice.patient_id,
                "doctor_id": invoice.doctor_id,
                "service": invoice.service,
                "amount": invoice.amount,
                "status": invoice.status,
            }),
        )
        .await
    }

    async fn update_invoice_status(&self, id: &str, status: &str) -> Result<Invoice, AppError> {
        self.patch_one(
            &format!("/rest/v1/invoices?id=eq.{}", encode(id)),
            json!({ "status": status }),
            "Invoice not found",
        )
        .await
    }

    async fn paid_invoice_total(&self, clinic_id: i64) -> Result<f64, AppError> {
        let rows: Vec<Value> = self
            .select(&format!(
                "/rest/v1/invoices?clinic_id=eq.{}&status=eq.Paid&select=amount",
                clinic_id
            ))
            .await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("amount").and_then(Value::as_f64))
            .sum())
    }

    // -- service orders -----------------------------------------------------

    async fn orders_by_clinic(
        &self,
        clinic_id: i64,
        order_type: OrderType,
    ) -> Result<Vec<ServiceOrder>, AppError> {
        self.select(&format!(
            "/rest/v1/service_orders?clinic_id=eq.{}&order_type=eq.{}&order=created_at.desc",
            clinic_id,
            order_type.as_str()
        ))
        .await
    }

    async fn order_by_id(&self, id: i64) -> Result<Option<ServiceOrder>, AppError> {
        self.select_one(&format!("/rest/v1/service_orders?id=eq.{}", id))
            .await
    }

    async fn create_order(&self, order: NewServiceOrder) -> Result<ServiceOrder, AppError> {
        self.insert(
            "service_orders",
            json!({
                "clinic_id": order.clinic_id,
                "patient_id": order.patient_id,
                "doctor_id": order.doctor_id,
                "order_type": order.order_type,
                "test_name": order.test_name,
                "details": order.details,
                "status": "Ordered",
            }),
        )
        .await
    }

    async fn update_order(&self, id: i64, patch: OrderPatch) -> Result<ServiceOrder, AppError> {
        let mut body = serde_json::Map::new();
        if let Some(status) = patch.status {
            body.insert("status".into(), json!(status));
        }
        if let Some(result) = patch.result {
            body.insert("result".into(), result);
        }
        self.patch_one(
            &format!("/rest/v1/service_orders?id=eq.{}", id),
            Value::Object(body),
            "Order not found",
        )
        .await
    }

    // -- inventory ----------------------------------------------------------

    async fn inventory_by_clinic(&self, clinic_id: i64) -> Result<Vec<InventoryItem>, AppError> {
        self.select(&format!(
            "/rest/v1/inventory?clinic_id=eq.{}&order=name.asc",
            clinic_id
        ))
        .await
    }

    async fn inventory_item(&self, id: i64) -> Result<Option<InventoryItem>, AppError> {
        self.select_one(&format!("/rest/v1/inventory?id=eq.{}", id)).await
    }

    async fn create_inventory_item(
        &self,
        item: NewInventoryItem,
    ) -> Result<InventoryItem, AppError> {
        self.insert(
            "inventory",
            json!({
                "clinic_id": item.clinic_id,
                "name": item.name,
                "sku": item.sku,
                "quantity": item.quantity,
                "unit_price": item.unit_price,
                "expiry_date": item.expiry_date,
            }),
        )
        .await
    }

    async fn update_inventory_item(
        &self,
        id: i64,
        patch: InventoryPatch,
    ) -> Result<InventoryItem, AppError> {
        let mut body = serde_json::Map::new();
        if let Some(name) = patch.name {
            body.insert("name".into(), json!(name));
        }
        if let Some(sku) = patch.sku {
            body.insert("sku".into(), json!(sku));
        }
        if let Some(quantity) = patch.quantity {
            body.insert("quantity".into(), json!(quantity));
        }
        if let Some(price) = patch.unit_price {
            body.insert("unit_price".into(), json!(price));
        }
        if let Some(expiry) = patch.expiry_date {
            body.insert("expiry_date".into(), json!(expiry));
        }
        self.patch_one(
            &format!("/rest/v1/inventory?id=eq.{}", id),
            Value::Object(body),
            "Inventory item not found",
        )
        .await
    }

    async fn deduct_stock(
        &self,
        clinic_id: i64,
        lines: &[StockLine],
    ) -> Result<Vec<InventoryItem>, AppError> {
        self.request(
            Method::POST,
            "/rest/v1/rpc/deduct_stock",
            Some(json!({ "p_clinic_id": clinic_id, "p_lines": lines })),
            false,
        )
        .await
    }

    // -- notifications ------------------------------------------------------

    async fn notifications_by_clinic(
        &self,
        clinic_id: i64,
    ) -> Result<Vec<Notification>, AppError> {
        self.select(&format!(
            "/rest/v1/notifications?clinic_id=eq.{}&order=created_at.desc",
            clinic_id
        ))
        .await
    }

    async fn recent_notifications(&self, limit: usize) -> Result<Vec<Notification>, AppError> {
        self.select(&format!(
            "/rest/v1/notifications?order=created_at.desc&limit={}",
            limit
        ))
        .await
    }

    async fn create_notification(&self, n: NewNotification) -> Result<Notification, AppError> {
        self.insert(
            "notifications",
            json!({
                "clinic_id": n.clinic_id,
                "department": n.department,
                "message": n.message,
                "status": "unread",
            }),
        )
        .await
    }

    async fn notification_by_id(&self, id: i64) -> Result<Option<Notification>, AppError> {
        self.select_one(&format!("/rest/v1/notifications?id=eq.{}", id))
            .await
    }

    async fn update_notification_status(
        &self,
        id: i64,
        status: &str,
    ) -> Result<Notification, AppError> {
        self.patch_one(
            &format!("/rest/v1/notifications?id=eq.{}", id),
            json!({ "status": status }),
            "Notification not found",
        )
        .await
    }

    // -- medical records ----------------------------------------------------

    async fn create_record(&self, record: NewMedicalRecord) -> Result<MedicalRecord, AppError> {
        self.insert(
            "medical_records",
            json!({
                "clinic_id": record.clinic_id,
                "patient_id": record.patient_id,
                "doctor_id": record.doctor_id,
                "template_id": record.template_id,
                "record_type": record.record_type,
                "data": record.data,
                "is_closed": record.is_closed,
            }),
        )
        .await
    }

    async fn records_for_patient(
        &self,
        clinic_id: i64,
        patient_id: i64,
    ) -> Result<Vec<MedicalRecord>, AppError> {
        self.select(&format!(
            "/rest/v1/medical_records?clinic_id=eq.{}&patient_id=eq.{}&order=created_at.desc",
            clinic_id, patient_id
        ))
        .await
    }

    async fn records_for_patients(
        &self,
        patient_ids: &[i64],
    ) -> Result<Vec<MedicalRecord>, AppError> {
        if patient_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = patient_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.select(&format!(
            "/rest/v1/medical_records?patient_id=in.({})&order=created_at.desc",
            ids
        ))
        .await
    }

    async fn records_for_doctor(
        &self,
        clinic_id: i64,
        doctor_id: i64,
    ) -> Result<Vec<MedicalRecord>, AppError> {
        self.select(&format!(
            "/rest/v1/medical_records?clinic_id=eq.{}&doctor_id=eq.{}&order=created_at.desc",
            clinic_id, doctor_id
        ))
        .await
    }

    async fn count_records(&self) -> Result<u64, AppError> {
        self.count("/rest/v1/medical_records?select=id").await
    }

    // -- form templates -----------------------------------------------------

    async fn templates_for_clinic(
        &self,
        clinic_id: i64,
        published_only: bool,
    ) -> Result<Vec<FormTemplate>, AppError> {
        let mut path = format!(
            "/rest/v1/form_templates?or=(clinic_id.is.null,clinic_id.eq.{})&order=name.asc",
            clinic_id
        );
        if published_only {
            path.push_str("&status=eq.published");
        }
        self.select(&path).await
    }

    async fn create_template(
        &self,
        template: NewFormTemplate,
    ) -> Result<FormTemplate, AppError> {
        self.insert(
            "form_templates",
            json!({
                "clinic_id": template.clinic_id,
                "name": template.name,
                "specialty": template.specialty,
                "fields": template.fields,
                "status": template.status,
            }),
        )
        .await
    }

    async fn template_by_id(&self, id: i64) -> Result<Option<FormTemplate>, AppError> {
        self.select_one(&format!("/rest/v1/form_templates?id=eq.{}", id))
            .await
    }

    async fn delete_template(&self, id: i64) -> Result<FormTemplate, AppError> {
        let mut rows: Vec<FormTemplate> = self
            .request(
                Method::DELETE,
                &format!("/rest/v1/form_templates?id=eq.{}", id),
                None,
                true,
            )
            .await?;
        if rows.is_empty() {
            return Err(AppError::NotFound("Form template not found".to_string()));
        }
        Ok(rows.remove(0))
    }

    // -- departments --------------------------------------------------------

    async fn departments_by_clinic(&self, clinic_id: i64) -> Result<Vec<Department>, AppError> {
        self.select(&format!(
            "/rest/v1/departments?clinic_id=eq.{}&order=name.asc",
            clinic_id
        ))
        .await
    }

    async fn create_department(
        &self,
        department: NewDepartment,
    ) -> Result<Department, AppError> {
        self.insert(
            "departments",
            json!({
                "clinic_id": department.clinic_id,
                "name": department.name,
                "kind": department.kind,
            }),
        )
        .await
    }

    async fn department_by_id(&self, id: i64) -> Result<Option<Department>, AppError> {
        self.select_one(&format!("/rest/v1/departments?id=eq.{}", id))
            .await
    }

    async fn delete_department(&self, id: i64) -> Result<(), AppError> {
        self.delete_rows(
            &format!("/rest/v1/departments?id=eq.{}", id),
            "Department not found",
        )
        .await
    }

    // -- audit log ----------------------------------------------------------

    async fn append_audit(&self, entry: NewAuditEntry) -> Result<(), AppError> {
        let _: Vec<Value> = self
            .request(
                Method::POST,
                "/rest/v1/audit_log",
                Some(json!({
                    "action": entry.action,
                    "performed_by": entry.performed_by,
                    "user_id": entry.user_id,
                    "clinic_id": entry.clinic_id,
                    "ip": entry.ip,
                    "device": entry.device,
                    "details": entry.details,
                })),
                true,
            )
            .await?;
        Ok(())
    }

    async fn audit_for_clinic(
        &self,
        clinic_id: i64,
        limit: usize,
    ) -> Result<Vec<AuditEntry>, AppError> {
        self.select(&format!(
            "/rest/v1/audit_log?clinic_id=eq.{}&order=timestamp.desc&limit={}",
            clinic_id, limit
        ))
        .await
    }

    async fn search_audit(&self, query: AuditQuery) -> Result<(Vec<AuditEntry>, u64), AppError> {
        let (limit, offset) = page_window(query.page, query.limit);
        let mut path = format!(
            "/rest/v1/audit_log?order=timestamp.desc&limit={}&offset={}",
            limit, offset
        );
        if let Some(term) = &query.search {
            let pattern = encode(&format!("*{}*", term));
            path.push_str(&format!(
                "&or=(action.ilike.{p},performed_by.ilike.{p})",
                p = pattern
            ));
        }
        if let Some(action) = &query.action {
            if action != "all" {
                path.push_str(&format!("&action=ilike.{}", encode(&format!("*{}*", action))));
            }
        }
        self.count_with_rows(&path).await
    }

    async fn latest_audit_action(&self, action: &str) -> Result<Option<AuditEntry>, AppError> {
        self.select_one(&format!(
            "/rest/v1/audit_log?action=eq.{}&order=timestamp.desc&limit=1",
            encode(action)
        ))
        .await
    }

    // -- password resets ----------------------------------------------------

    async fn create_password_reset(&self, reset: PasswordReset) -> Result<(), AppError> {
        let _: Vec<Value> = self
            .request(
                Method::POST,
                "/rest/v1/password_resets",
                Some(json!({
                    "token": reset.token,
                    "user_id": reset.user_id,
                    "expires_at": reset.expires_at,
                })),
                true,
            )
            .await?;
        Ok(())
    }

    async fn take_password_reset(&self, token: Uuid) -> Result<Option<PasswordReset>, AppError> {
        // DELETE with representation both consumes and returns the row, so a
        // token can only ever be redeemed once.
        let mut rows: Vec<PasswordReset> = self
            .request(
                Method::DELETE,
                &format!("/rest/v1/password_resets?token=eq.{}", token),
                None,
                true,
            )
            .await?;
        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(rows.remove(0)))
        }
    }
}
