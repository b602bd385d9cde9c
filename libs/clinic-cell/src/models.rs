use serde::{Deserialize, Serialize};
use serde_json::Value;

use shared_models::Role;

#[derive(Debug, Serialize)]
pub struct ClinicStats {
    pub patients: u64,
    pub staff: usize,
    pub appointments_today: usize,
    pub revenue: f64,
}

/// One staff member of the clinic with every role row they hold, so a user
/// who is both DOCTOR and ADMIN appears once.
#[derive(Debug, Serialize)]
pub struct StaffGroup {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub status: String,
    pub roles: Vec<StaffRoleRow>,
}

#[derive(Debug, Serialize)]
pub struct StaffRoleRow {
    pub staff_id: i64,
    pub role: Role,
    pub department: Option<String>,
    pub specialty: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddStaffRequest {
    pub name: String,
    pub email: String,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub department: Option<String>,
    pub specialty: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStaffRequest {
    pub role: Option<Role>,
    pub department: Option<String>,
    pub specialty: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub specialty: String,
    pub fields: Value,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDepartmentRequest {
    pub name: String,
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NotificationStatusRequest {
    pub status: String,
}
