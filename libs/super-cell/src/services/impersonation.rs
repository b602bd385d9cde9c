use std::sync::Arc;

use chrono::Duration;
use serde_json::json;

use shared_config::AppConfig;
use shared_database::Store;
use shared_models::{effective_role, AppError, AuthUser, NewAuditEntry, Role};
use shared_utils::state::AppState;
use shared_utils::{audit, jwt};

use crate::models::ImpersonationGrant;

const IMPERSONATION_HOURS: i64 = 4;

pub struct ImpersonationService {
    store: Arc<dyn Store>,
    config: Arc<AppConfig>,
}

impl ImpersonationService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            config: state.config.clone(),
        }
    }

    /// Issues a four-hour token acting as the target user. Super admins can
    /// never be impersonated.
    pub async fn impersonate_user(
        &self,
        actor: &AuthUser,
        target_id: i64,
    ) -> Result<ImpersonationGrant, AppError> {
        let target = self
            .store
            .user_by_id(target_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let memberships = self.store.staff_for_user(target.id).await?;
        let membership_roles: Vec<Role> = memberships.iter().map(|m| m.role).collect();
        let role = effective_role(target.role, &membership_roles);
        if role == Role::SuperAdmin {
            return Err(AppError::InvalidTarget(
                "Super admin accounts cannot be impersonated".to_string(),
            ));
        }

        let clinic_id = if memberships.len() == 1 {
            Some(memberships[0].clinic_id)
        } else {
            None
        };

        let token = jwt::issue(
            target.id,
            role,
            clinic_id,
            Some(actor.email.clone()),
            Duration::hours(IMPERSONATION_HOURS),
            &self.config.jwt_secret,
        )?;

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Impersonation Started", &actor.email)
                .user(actor.id)
                .details(json!({ "target": target.email })),
        )
        .await;

        Ok(ImpersonationGrant {
            token,
            acting_as: target.email,
            role,
            clinic_id,
        })
    }

    /// Enters a clinic as one of its staff members: an ADMIN if the clinic
    /// has one, otherwise any staff member.
    pub async fn impersonate_clinic(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
    ) -> Result<ImpersonationGrant, AppError> {
        self.store
            .clinic_by_id(clinic_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Clinic not found".to_string()))?;

        let staff = self.store.staff_for_clinic(clinic_id).await?;
        let chosen = staff
            .iter()
            .find(|s| s.role == Role::Admin)
            .or_else(|| staff.first())
            .ok_or(AppError::NoStaffFound)?;

        let target = self
            .store
            .user_by_id(chosen.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let token = jwt::issue(
            target.id,
            chosen.role,
            Some(clinic_id),
            Some(actor.email.clone()),
            Duration::hours(IMPERSONATION_HOURS),
            &self.config.jwt_secret,
        )?;

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Impersonation Started", &actor.email)
                .user(actor.id)
                .clinic(clinic_id)
                .details(json!({ "target": target.email })),
        )
        .await;

        Ok(ImpersonationGrant {
            token,
            acting_as: target.email,
            role: chosen.role,
            clinic_id: Some(clinic_id),
        })
    }
}
