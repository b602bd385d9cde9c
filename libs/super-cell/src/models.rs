use serde::{Deserialize, Serialize};

use shared_models::{ClinicModules, Role};

#[derive(Debug, Deserialize)]
pub struct CreateClinicRequest {
    pub name: String,
    pub subdomain: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
    pub modules: Option<ClinicModules>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateClinicRequest {
    pub name: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateModulesRequest {
    pub modules: ClinicModules,
}

#[derive(Debug, Deserialize)]
pub struct ProvisionAdminRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStaffRequest {
    pub role: Option<Role>,
    pub department: Option<String>,
    pub specialty: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuditSearchQuery {
    pub search: Option<String>,
    pub action: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ImpersonateUserRequest {
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ImpersonateClinicRequest {
    pub clinic_id: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub clinics: u64,
    pub admins: u64,
    pub patients: u64,
    pub active_modules: usize,
    pub uptime_seconds: i64,
}

/// Cross-tenant staff row joined with its user and clinic for the global
/// staff table.
#[derive(Debug, Serialize)]
pub struct GlobalStaffRow {
    pub staff_id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub status: String,
    pub role: Role,
    pub clinic_id: i64,
    pub clinic_name: String,
    pub department: Option<String>,
    pub specialty: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImpersonationGrant {
    pub token: String,
    pub acting_as: String,
    pub role: Role,
    pub clinic_id: Option<i64>,
}
