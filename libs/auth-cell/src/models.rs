use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::Role;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub captcha: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
}

/// The identity payload a successful login or clinic selection hands back to
/// the frontend.
#[derive(Debug, Serialize)]
pub struct SessionUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub clinic_id: Option<i64>,
    pub clinics: Vec<MembershipSummary>,
}

#[derive(Debug, Serialize)]
pub struct MembershipSummary {
    pub clinic_id: i64,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct ClinicSummary {
    pub id: i64,
    pub name: String,
    pub role: Role,
    pub location: Option<String>,
    pub status: String,
    pub modules: shared_models::ClinicModules,
}

#[derive(Debug, Deserialize)]
pub struct SelectClinicRequest {
    pub clinic_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: Uuid,
    pub new_password: String,
}
