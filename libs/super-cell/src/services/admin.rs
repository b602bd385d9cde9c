use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};
use tracing::info;

use shared_models::{
    AppError, AuditEntry, AuditQuery, AuthUser, Clinic, ClinicModules, ClinicPatch, NewAuditEntry,
    NewClinic, NewStaff, NewUser, Notification, Role, StaffPatch, UserPatch,
};
use shared_utils::state::AppState;
use shared_utils::{audit, password};

use crate::models::{
    AuditSearchQuery, CreateClinicRequest, DashboardStats, GlobalStaffRow, ProvisionAdminRequest,
    UpdateClinicRequest, UpdateStaffRequest,
};

/// Lowercased, hyphen-separated slug for the clinic subdomain.
fn slugify(name: &str) -> String {
    static NON_SLUG: OnceLock<Regex> = OnceLock::new();
    let re = NON_SLUG.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap());
    re.replace_all(&name.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

pub struct SuperAdminService {
    state: AppState,
}

impl SuperAdminService {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    fn store(&self) -> &dyn shared_database::Store {
        self.state.store.as_ref()
    }

    pub async fn dashboard(&self) -> Result<DashboardStats, AppError> {
        let clinics = self.store().list_clinics().await?;
        let staff = self.store().all_staff().await?;
        let admins: HashSet<i64> = staff
            .iter()
            .filter(|s| s.role == Role::Admin)
            .map(|s| s.user_id)
            .collect();
        let active_modules = clinics.iter().map(|c| c.modules.enabled_count()).sum();

        Ok(DashboardStats {
            clinics: clinics.len() as u64,
            admins: admins.len() as u64,
            patients: self.store().count_patients(None).await?,
            active_modules,
            uptime_seconds: self.state.uptime_seconds(),
        })
    }

    pub async fn alerts(&self) -> Result<Vec<Notification>, AppError> {
        self.store().recent_notifications(10).await
    }

    pub async fn list_clinics(&self) -> Result<Vec<Clinic>, AppError> {
        self.store().list_clinics().await
    }

    pub async fn create_clinic(
        &self,
        actor: &AuthUser,
        request: CreateClinicRequest,
    ) -> Result<Clinic, AppError> {
        if request.name.trim().is_empty() {
            return Err(AppError::Validation("Clinic name is required".to_string()));
        }

        let subdomain = slugify(request.subdomain.as_deref().unwrap_or(&request.name));
        if subdomain.is_empty() {
            return Err(AppError::Validation(
                "Clinic name does not produce a valid subdomain".to_string(),
            ));
        }
        if self.store().clinic_by_subdomain(&subdomain).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "A clinic with subdomain '{}' already exists",
                subdomain
            )));
        }

        let clinic = self
            .store()
            .create_clinic(NewClinic {
                name: request.name,
                subdomain,
                location: request.location,
                email: request.email,
                contact: request.contact,
                modules: request.modules.unwrap_or_default(),
            })
            .await?;

        audit::record(
            self.store(),
            NewAuditEntry::new("Clinic Created", &actor.email)
                .user(actor.id)
                .clinic(clinic.id)
                .details(json!({ "name": clinic.name, "subdomain": clinic.subdomain })),
        )
        .await;
        info!("Clinic {} created", clinic.id);
        Ok(clinic)
    }

    pub async fn update_clinic(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        request: UpdateClinicRequest,
    ) -> Result<Clinic, AppError> {
        let clinic = self
            .store()
            .update_clinic(
                clinic_id,
                ClinicPatch {
                    name: request.name,
                    location: request.location,
                    email: request.email,
                    contact: request.contact,
                    ..Default::default()
                },
            )
            .await?;

        audit::record(
            self.store(),
            NewAuditEntry::new("Clinic Updated", &actor.email)
                .user(actor.id)
                .clinic(clinic_id),
        )
        .await;
        Ok(clinic)
    }

    pub async fn toggle_clinic_status(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
    ) -> Result<Clinic, AppError> {
        let clinic = self
            .store()
            .clinic_by_id(clinic_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Clinic not found".to_string()))?;
        let next = if clinic.status == "active" {
            "inactive"
        } else {
            "active"
        };

        let updated = self
            .store()
            .update_clinic(
                clinic_id,
                ClinicPatch {
                    status: Some(next.to_string()),
                    ..Default::default()
                },
            )
            .await?;

        audit::record(
            self.store(),
            NewAuditEntry::new("Clinic Status Changed", &actor.email)
                .user(actor.id)
                .clinic(clinic_id)
                .details(json!({ "status": next })),
        )
        .await;
        Ok(updated)
    }

    pub async fn update_modules(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        modules: ClinicModules,
    ) -> Result<Clinic, AppError> {
        let updated = self
            .store()
            .update_clinic(
                clinic_id,
                ClinicPatch {
                    modules: Some(modules),
                    ..Default::default()
                },
            )
            .await?;

        audit::record(
            self.store(),
            NewAuditEntry::new("Clinic Modules Updated", &actor.email)
                .user(actor.id)
                .clinic(clinic_id)
                .details(json!(modules)),
        )
        .await;
        Ok(updated)
    }

    pub async fn delete_clinic(&self, actor: &AuthUser, clinic_id: i64) -> Result<(), AppError> {
        self.store().delete_clinic(clinic_id).await?;
        audit::record(
            self.store(),
            NewAuditEntry::new("Clinic Deleted", &actor.email)
                .user(actor.id)
                .clinic(clinic_id),
        )
        .await;
        Ok(())
    }

    /// Creates (or reuses) the user account and attaches an ADMIN staff row
    /// for the clinic.
    pub async fn provision_admin(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        request: ProvisionAdminRequest,
    ) -> Result<GlobalStaffRow, AppError> {
        let clinic = self
            .store()
            .clinic_by_id(clinic_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Clinic not found".to_string()))?;

        let user = match self.store().user_by_email(&request.email).await? {
            Some(existing) => existing,
            None => {
                let hash = password::hash_password(&request.password)?;
                self.store()
                    .create_user(NewUser {
                        email: request.email.clone(),
                        password_hash: hash,
                        name: request.name.clone(),
                        phone: request.phone.clone(),
                        role: Role::Receptionist,
                    })
                    .await?
            }
        };

        if self.store().membership(user.id, clinic_id).await?.is_some() {
            return Err(AppError::Validation(
                "This user is already a staff member of the clinic".to_string(),
            ));
        }

        let staff = self
            .store()
            .create_staff(NewStaff {
                user_id: user.id,
                clinic_id,
                role: Role::Admin,
                department: None,
                specialty: None,
            })
            .await?;

        audit::record(
            self.store(),
            NewAuditEntry::new("Clinic Admin Provisioned", &actor.email)
                .user(actor.id)
                .clinic(clinic_id)
                .details(json!({ "admin_email": user.email })),
        )
        .await;

        Ok(GlobalStaffRow {
            staff_id: staff.id,
            user_id: user.id,
            name: user.name,
            email: user.email,
            status: user.status,
            role: staff.role,
            clinic_id,
            clinic_name: clinic.name,
            department: None,
            specialty: None,
        })
    }

    pub async fn global_staff(&self) -> Result<Vec<GlobalStaffRow>, AppError> {
        let staff = self.store().all_staff().await?;
        let clinics = self.store().list_clinics().await?;

        let mut rows = Vec::with_capacity(staff.len());
        for member in staff {
            let Some(user) = self.store().user_by_id(member.user_id).await? else {
                continue;
            };
            let clinic_name = clinics
                .iter()
                .find(|c| c.id == member.clinic_id)
                .map(|c| c.name.clone())
                .unwrap_or_default();
            rows.push(GlobalStaffRow {
                staff_id: member.id,
                user_id: user.id,
                name: user.name,
                email: user.email,
                status: user.status,
                role: member.role,
                clinic_id: member.clinic_id,
                clinic_name,
                department: member.department,
                specialty: member.specialty,
            });
        }
        Ok(rows)
    }

    pub async fn update_staff(
        &self,
        actor: &AuthUser,
        staff_id: i64,
        request: UpdateStaffRequest,
    ) -> Result<(), AppError> {
        self.store()
            .update_staff(
                staff_id,
                StaffPatch {
                    role: request.role,
                    department: request.department,
                    specialty: request.specialty,
                },
            )
            .await?;

        audit::record(
            self.store(),
            NewAuditEntry::new("Staff Updated", &actor.email).user(actor.id),
        )
        .await;
        Ok(())
    }

    pub async fn toggle_staff_status(
        &self,
        actor: &AuthUser,
        staff_id: i64,
    ) -> Result<String, AppError> {
        let staff = self
            .store()
            .staff_by_id(staff_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Staff record not found".to_string()))?;
        let user = self
            .store()
            .user_by_id(staff.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let next = if user.status == "active" {
            "inactive"
        } else {
            "active"
        };
        self.store()
            .update_user(
                user.id,
                UserPatch {
                    status: Some(next.to_string()),
                    ..Default::default()
                },
            )
            .await?;

        audit::record(
            self.store(),
            NewAuditEntry::new("Staff Status Changed", &actor.email)
                .user(actor.id)
                .details(json!({ "target": user.email, "status": next })),
        )
        .await;
        Ok(next.to_string())
    }

    /// Removes the staff row only; the user account survives and keeps any
    /// memberships in other clinics.
    pub async fn delete_staff(&self, actor: &AuthUser, staff_id: i64) -> Result<(), AppError> {
        self.store().delete_staff(staff_id).await?;
        audit::record(
            self.store(),
            NewAuditEntry::new("Staff Removed", &actor.email).user(actor.id),
        )
        .await;
        Ok(())
    }

    pub async fn search_audit(
        &self,
        query: AuditSearchQuery,
    ) -> Result<(Vec<AuditEntry>, u64), AppError> {
        self.store()
            .search_audit(AuditQuery {
                search: query.search,
                action: query.action,
                page: query.page.unwrap_or(1),
                limit: query.limit.unwrap_or(50),
            })
            .await
    }

    pub fn settings(&self) -> Value {
        json!({
            "environment": self.state.config.environment,
            "allowed_origin": self.state.config.allowed_origin,
            "version": env!("CARGO_PKG_VERSION"),
        })
    }

    pub async fn storage_stats(&self) -> Result<Value, AppError> {
        let clinics = self.store().count_clinics().await?;
        let patients = self.store().count_patients(None).await?;
        let records = self.store().count_records().await?;
        Ok(json!({
            "clinics": clinics,
            "patients": patients,
            "medical_records": records,
        }))
    }

    pub async fn trigger_backup(&self, actor: &AuthUser) -> Result<Value, AppError> {
        // The backup itself runs out-of-band; what matters here is the
        // audited trigger point.
        self.store()
            .append_audit(NewAuditEntry::new("System Backup", &actor.email).user(actor.id))
            .await?;

        let latest = self.store().latest_audit_action("System Backup").await?;
        Ok(json!({
            "triggered_at": latest.map(|e| e.timestamp),
        }))
    }
}
