use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::Store;
use shared_models::{
    effective_role, AppError, AuthUser, NewAuditEntry, PasswordReset, Role, UserPatch,
};
use shared_utils::state::AppState;
use shared_utils::{audit, jwt, password};

use crate::models::{ClinicSummary, LoginResponse, MembershipSummary, SessionUser};

const CAPTCHA_THRESHOLD: i32 = 3;
const LOCKOUT_THRESHOLD: i32 = 5;
const LOCKOUT_MINUTES: i64 = 15;

pub struct AuthService {
    store: Arc<dyn Store>,
    config: Arc<AppConfig>,
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            config: state.config.clone(),
        }
    }

    pub async fn login(
        &self,
        email: &str,
        raw_password: &str,
        captcha: Option<&str>,
        ip: Option<String>,
        device: Option<String>,
    ) -> Result<LoginResponse, AppError> {
        let user = self
            .store
            .user_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if let Some(until) = user.lockout_until {
            let remaining = until - Utc::now();
            if remaining > Duration::zero() {
                let minutes = (remaining.num_seconds() + 59) / 60;
                return Err(AppError::AccountLocked(minutes));
            }
        }

        // Captcha is demanded before the password is even checked, so a bot
        // cannot keep probing credentials past the threshold.
        if user.failed_login_attempts >= CAPTCHA_THRESHOLD {
            let answer = captcha.unwrap_or_default();
            if answer != self.config.captcha_answer {
                return Err(AppError::CaptchaRequired);
            }
        }

        if !password::verify_password(raw_password, &user.password_hash)? {
            let attempts = user.failed_login_attempts + 1;
            let lockout = if attempts >= LOCKOUT_THRESHOLD {
                Some(Some(Utc::now() + Duration::minutes(LOCKOUT_MINUTES)))
            } else {
                None
            };
            self.store
                .update_user(
                    user.id,
                    UserPatch {
                        failed_login_attempts: Some(attempts),
                        lockout_until: lockout,
                        ..Default::default()
                    },
                )
                .await?;
            audit::record(
                self.store.as_ref(),
                NewAuditEntry::new("Login Failed", email)
                    .user(user.id)
                    .client(ip, device)
                    .details(json!({ "attempts": attempts })),
            )
            .await;
            return Err(AppError::InvalidCredentials);
        }

        if user.failed_login_attempts > 0 || user.lockout_until.is_some() {
            self.store
                .update_user(
                    user.id,
                    UserPatch {
                        failed_login_attempts: Some(0),
                        lockout_until: Some(None),
                        ..Default::default()
                    },
                )
                .await?;
        }

        let memberships = self.store.staff_for_user(user.id).await?;
        let membership_roles: Vec<Role> = memberships.iter().map(|m| m.role).collect();
        let role = effective_role(user.role, &membership_roles);

        // A user with exactly one clinic goes straight into it; the token is
        // locked to that clinic and no selection step is needed.
        let clinic_id = if role != Role::SuperAdmin && memberships.len() == 1 {
            Some(memberships[0].clinic_id)
        } else {
            None
        };

        let token = jwt::issue(
            user.id,
            role,
            clinic_id,
            None,
            Duration::hours(1),
            &self.config.jwt_secret,
        )?;

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Login Success", &user.email)
                .user(user.id)
                .client(ip, device),
        )
        .await;
        info!("User {} logged in as {}", user.id, role);

        Ok(LoginResponse {
            token,
            user: SessionUser {
                id: user.id,
                name: user.name,
                email: user.email,
                role,
                clinic_id,
                clinics: memberships
                    .iter()
                    .map(|m| MembershipSummary {
                        clinic_id: m.clinic_id,
                        role: m.role,
                    })
                    .collect(),
            },
        })
    }

    pub async fn my_clinics(&self, user: &AuthUser) -> Result<Vec<ClinicSummary>, AppError> {
        if user.role == Role::SuperAdmin {
            let clinics = self.store.list_clinics().await?;
            return Ok(clinics
                .into_iter()
                .map(|c| ClinicSummary {
                    id: c.id,
                    name: c.name,
                    role: Role::SuperAdmin,
                    location: c.location,
                    status: c.status,
                    modules: c.modules,
                })
                .collect());
        }

        let memberships = self.store.staff_for_user(user.id).await?;
        let mut summaries = Vec::with_capacity(memberships.len());
        for membership in memberships {
            if let Some(clinic) = self.store.clinic_by_id(membership.clinic_id).await? {
                summaries.push(ClinicSummary {
                    id: clinic.id,
                    name: clinic.name,
                    role: membership.role,
                    location: clinic.location,
                    status: clinic.status,
                    modules: clinic.modules,
                });
            }
        }
        Ok(summaries)
    }

    pub async fn select_clinic(
        &self,
        user: &AuthUser,
        clinic_id: i64,
    ) -> Result<LoginResponse, AppError> {
        self.store
            .clinic_by_id(clinic_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Clinic not found".to_string()))?;

        let role = if user.role == Role::SuperAdmin {
            Role::SuperAdmin
        } else {
            self.store
                .membership(user.id, clinic_id)
                .await?
                .ok_or_else(|| {
                    AppError::Forbidden("You do not have access to this clinic".to_string())
                })?
                .role
        };

        let token = jwt::issue(
            user.id,
            role,
            Some(clinic_id),
            user.impersonated_by.clone(),
            Duration::hours(8),
            &self.config.jwt_secret,
        )?;

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Clinic Selected", &user.email)
                .user(user.id)
                .clinic(clinic_id),
        )
        .await;

        let memberships = self.store.staff_for_user(user.id).await?;
        let db_user = self
            .store
            .user_by_id(user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(LoginResponse {
            token,
            user: SessionUser {
                id: db_user.id,
                name: db_user.name,
                email: db_user.email,
                role,
                clinic_id: Some(clinic_id),
                clinics: memberships
                    .iter()
                    .map(|m| MembershipSummary {
                        clinic_id: m.clinic_id,
                        role: m.role,
                    })
                    .collect(),
            },
        })
    }

    pub async fn change_password(
        &self,
        user: &AuthUser,
        current: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let db_user = self
            .store
            .user_by_id(user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !password::verify_password(current, &db_user.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        let hash = password::hash_password(new_password)?;
        self.store
            .update_user(
                user.id,
                UserPatch {
                    password_hash: Some(hash),
                    ..Default::default()
                },
            )
            .await?;

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Password Changed", &user.email).user(user.id),
        )
        .await;
        Ok(())
    }

    pub async fn refresh_token(&self, user: &AuthUser) -> Result<String, AppError> {
        let db_user = self
            .store
            .user_by_id(user.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        jwt::issue(
            db_user.id,
            db_user.role,
            None,
            None,
            Duration::hours(1),
            &self.config.jwt_secret,
        )
    }

    /// Always answers with the same generic message; whether the account
    /// exists is never revealed.
    pub async fn forgot_password(&self, email: &str) -> Result<&'static str, AppError> {
        if let Some(user) = self.store.user_by_email(email).await? {
            let reset = PasswordReset {
                token: Uuid::new_v4(),
                user_id: user.id,
                expires_at: Utc::now() + Duration::hours(1),
            };
            debug!("Created password reset for user {}", user.id);
            self.store.create_password_reset(reset).await?;
        }
        Ok("If an account exists for that email, a reset link has been sent.")
    }

    pub async fn reset_password(
        &self,
        token: Uuid,
        new_password: &str,
    ) -> Result<(), AppError> {
        let reset = self
            .store
            .take_password_reset(token)
            .await?
            .filter(|r| r.expires_at > Utc::now())
            .ok_or_else(|| AppError::Validation("Invalid or expired reset token".to_string()))?;

        let hash = password::hash_password(new_password)?;
        self.store
            .update_user(
                reset.user_id,
                UserPatch {
                    password_hash: Some(hash),
                    failed_login_attempts: Some(0),
                    lockout_until: Some(None),
                    ..Default::default()
                },
            )
            .await?;

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Password Reset", "password-reset").user(reset.user_id),
        )
        .await;
        Ok(())
    }
}
