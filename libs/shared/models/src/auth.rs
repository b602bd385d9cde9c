use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::roles::Role;

/// JWT claims. The token is the sole identity channel between the auth layer
/// and everything downstream, so the claim set is deliberately small.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinic_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impersonated_by: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated identity attached to request extensions by the auth
/// middleware. `clinic_id` is the clinic-locked claim, if any.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub clinic_id: Option<i64>,
    pub impersonated_by: Option<String>,
}

/// Clinic id resolved by the clinic-context middleware. `None` only for
/// super-admins operating cross-tenant.
#[derive(Debug, Clone, Copy)]
pub struct ClinicContext(pub Option<i64>);

impl ClinicContext {
    pub fn id(&self) -> Option<i64> {
        self.0
    }

    pub fn require(&self) -> Result<i64, AppError> {
        self.0.ok_or(AppError::NoClinicContext)
    }
}
