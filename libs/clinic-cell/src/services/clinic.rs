use std::sync::Arc;

use chrono::Utc;
use serde_json::json;

use shared_database::Store;
use shared_models::{
    AppError, AuditEntry, AuthUser, BookingConfig, ClinicPatch, Department, FormTemplate,
    NewAuditEntry, NewDepartment, NewFormTemplate, NewStaff, NewUser, Notification, Role,
    StaffPatch,
};
use shared_utils::state::AppState;
use shared_utils::{audit, password};

use crate::models::{
    AddStaffRequest, ClinicStats, CreateDepartmentRequest, CreateTemplateRequest, StaffGroup,
    StaffRoleRow, UpdateStaffRequest,
};

pub struct ClinicService {
    store: Arc<dyn Store>,
}

impl ClinicService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    pub async fn stats(&self, clinic_id: i64) -> Result<ClinicStats, AppError> {
        let staff = self.store.staff_for_clinic(clinic_id).await?;
        let today = Utc::now().date_naive();
        let appointments = self
            .store
            .appointments_by_clinic(clinic_id, Some(today))
            .await?;

        Ok(ClinicStats {
            patients: self.store.count_patients(Some(clinic_id)).await?,
            staff: staff.len(),
            appointments_today: appointments.len(),
            revenue: self.store.paid_invoice_total(clinic_id).await?,
        })
    }

    pub async fn activities(&self, clinic_id: i64) -> Result<Vec<AuditEntry>, AppError> {
        self.store.audit_for_clinic(clinic_id, 20).await
    }

    pub async fn staff(&self, clinic_id: i64) -> Result<Vec<StaffGroup>, AppError> {
        let rows = self.store.staff_for_clinic(clinic_id).await?;
        let mut groups: Vec<StaffGroup> = Vec::new();

        for row in rows {
            let role_row = StaffRoleRow {
                staff_id: row.id,
                role: row.role,
                department: row.department.clone(),
                specialty: row.specialty.clone(),
            };
            if let Some(group) = groups.iter_mut().find(|g| g.user_id == row.user_id) {
                group.roles.push(role_row);
                continue;
            }
            let Some(user) = self.store.user_by_id(row.user_id).await? else {
                continue;
            };
            groups.push(StaffGroup {
                user_id: user.id,
                name: user.name,
                email: user.email,
                status: user.status,
                roles: vec![role_row],
            });
        }
        Ok(groups)
    }

    /// Adds a role row for a new or existing user. The same role twice in one
    /// clinic is rejected; a second, different role for the same user is the
    /// supported multi-role case.
    pub async fn add_staff(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        request: AddStaffRequest,
    ) -> Result<StaffGroup, AppError> {
        let user = match self.store.user_by_email(&request.email).await? {
            Some(existing) => existing,
            None => {
                let raw_password = request.password.as_deref().ok_or_else(|| {
                    AppError::Validation(
                        "A password is required when creating a new staff account".to_string(),
                    )
                })?;
                self.store
                    .create_user(NewUser {
                        email: request.email.clone(),
                        password_hash: password::hash_password(raw_password)?,
                        name: request.name.clone(),
                        phone: request.phone.clone(),
                        role: Role::Receptionist,
                    })
                    .await?
            }
        };

        let existing_roles = self.store.staff_for_clinic(clinic_id).await?;
        if existing_roles
            .iter()
            .any(|s| s.user_id == user.id && s.role == request.role)
        {
            return Err(AppError::Validation(format!(
                "{} already holds the {} role in this clinic",
                user.email, request.role
            )));
        }

        let staff = self
            .store
            .create_staff(NewStaff {
                user_id: user.id,
                clinic_id,
                role: request.role,
                department: request.department,
                specialty: request.specialty,
            })
            .await?;

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Staff Added", &actor.email)
                .user(actor.id)
                .clinic(clinic_id)
                .details(json!({ "staff_email": user.email, "role": staff.role })),
        )
        .await;

        Ok(StaffGroup {
            user_id: user.id,
            name: user.name,
            email: user.email,
            status: user.status,
            roles: vec![StaffRoleRow {
                staff_id: staff.id,
                role: staff.role,
                department: staff.department,
                specialty: staff.specialty,
            }],
        })
    }

    pub async fn update_staff(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        staff_id: i64,
        request: UpdateStaffRequest,
    ) -> Result<(), AppError> {
        let staff = self
            .store
            .staff_by_id(staff_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Staff record not found".to_string()))?;
        if staff.clinic_id != clinic_id {
            return Err(AppError::Forbidden(
                "Staff record belongs to another clinic".to_string(),
            ));
        }

        self.store
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
            self.store.as_ref(),
            NewAuditEntry::new("Staff Updated", &actor.email)
                .user(actor.id)
                .clinic(clinic_id),
        )
        .await;
        Ok(())
    }

    /// Unlinks the role row from the clinic; the user account itself is kept.
    pub async fn remove_staff(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        staff_id: i64,
    ) -> Result<(), AppError> {
        let staff = self
            .store
            .staff_by_id(staff_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Staff record not found".to_string()))?;
        if staff.clinic_id != clinic_id {
            return Err(AppError::Forbidden(
                "Staff record belongs to another clinic".to_string(),
            ));
        }

        self.store.delete_staff(staff_id).await?;
        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Staff Removed", &actor.email)
                .user(actor.id)
                .clinic(clinic_id),
        )
        .await;
        Ok(())
    }

    pub async fn booking_config(&self, clinic_id: i64) -> Result<BookingConfig, AppError> {
        let clinic = self
            .store
            .clinic_by_id(clinic_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Clinic not found".to_string()))?;
        Ok(clinic.booking_config.unwrap_or_default())
    }

    pub async fn update_booking_config(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        config: BookingConfig,
    ) -> Result<BookingConfig, AppError> {
        let updated = self
            .store
            .update_clinic(
                clinic_id,
                ClinicPatch {
                    booking_config: Some(config),
                    ..Default::default()
                },
            )
            .await?;

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Booking Config Updated", &actor.email)
                .user(actor.id)
                .clinic(clinic_id),
        )
        .await;
        Ok(updated.booking_config.unwrap_or_default())
    }

    pub async fn templates(&self, clinic_id: i64) -> Result<Vec<FormTemplate>, AppError> {
        self.store.templates_for_clinic(clinic_id, false).await
    }

    pub async fn create_template(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        request: CreateTemplateRequest,
    ) -> Result<FormTemplate, AppError> {
        let template = self
            .store
            .create_template(NewFormTemplate {
                clinic_id: Some(clinic_id),
                name: request.name,
                specialty: request.specialty,
                fields: request.fields,
                status: request.status.unwrap_or_else(|| "draft".to_string()),
            })
            .await?;

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Form Template Created", &actor.email)
                .user(actor.id)
                .clinic(clinic_id)
                .details(json!({ "template": template.name })),
        )
        .await;
        Ok(template)
    }

    /// Global templates (`clinic_id: None`) are readable everywhere but can
    /// only be removed through super-admin tooling.
    pub async fn delete_template(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        template_id: i64,
    ) -> Result<(), AppError> {
        let template = self
            .store
            .template_by_id(template_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Form template not found".to_string()))?;
        if template.clinic_id != Some(clinic_id) {
            return Err(AppError::Forbidden(
                "Template does not belong to this clinic".to_string(),
            ));
        }

        let template = self.store.delete_template(template_id).await?;
        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Form Template Deleted", &actor.email)
                .user(actor.id)
                .clinic(clinic_id)
                .details(json!({ "template": template.name })),
        )
        .await;
        Ok(())
    }

    pub async fn departments(&self, clinic_id: i64) -> Result<Vec<Department>, AppError> {
        self.store.departments_by_clinic(clinic_id).await
    }

    pub async fn create_department(
        &self,
        clinic_id: i64,
        request: CreateDepartmentRequest,
    ) -> Result<Department, AppError> {
        self.store
            .create_department(NewDepartment {
                clinic_id,
                name: request.name,
                kind: request.kind,
            })
            .await
    }

    pub async fn delete_department(
        &self,
        clinic_id: i64,
        department_id: i64,
    ) -> Result<(), AppError> {
        let department = self
            .store
            .department_by_id(department_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Department not found".to_string()))?;
        if department.clinic_id != clinic_id {
            return Err(AppError::Forbidden(
                "Department belongs to another clinic".to_string(),
            ));
        }
        self.store.delete_department(department_id).await
    }

    pub async fn notifications(&self, clinic_id: i64) -> Result<Vec<Notification>, AppError> {
        self.store.notifications_by_clinic(clinic_id).await
    }

    pub async fn update_notification_status(
        &self,
        clinic_id: i64,
        notification_id: i64,
        status: &str,
    ) -> Result<Notification, AppError> {
        if !matches!(status, "unread" | "read") {
            return Err(AppError::Validation(format!(
                "Unknown notification status '{}'",
                status
            )));
        }
        let notification = self
            .store
            .notification_by_id(notification_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;
        if notification.clinic_id != clinic_id {
            return Err(AppError::Forbidden(
                "Notification belongs to another clinic".to_string(),
            ));
        }
        self.store
            .update_notification_status(notification_id, status)
            .await
    }
}
