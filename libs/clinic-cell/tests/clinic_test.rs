use std::sync::Arc;

use assert_matches::assert_matches;

use clinic_cell::models::{AddStaffRequest, UpdateStaffRequest};
use clinic_cell::services::ClinicService;
use shared_config::AppConfig;
use shared_database::{MemoryStore, Store};
use shared_models::{
    AppError, AuthUser, BookingConfig, NewClinic, NewDepartment, NewFormTemplate,
    NewNotification, Role,
};
use shared_utils::state::AppState;

struct Harness {
    store: Arc<MemoryStore>,
    state: AppState,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(AppConfig::default(), store.clone());
    Harness { store, state }
}

fn admin(clinic_id: i64) -> AuthUser {
    AuthUser {
        id: 1,
        email: "admin@clinic.test".to_string(),
        role: Role::Admin,
        clinic_id: Some(clinic_id),
        impersonated_by: None,
    }
}

async fn seed_clinic(store: &MemoryStore) -> i64 {
    store
        .create_clinic(NewClinic {
            name: "Test Clinic".to_string(),
            subdomain: "test-clinic".to_string(),
            location: None,
            email: None,
            contact: None,
            modules: Default::default(),
        })
        .await
        .unwrap()
        .id
}

fn staff_request(email: &str, role: Role) -> AddStaffRequest {
    AddStaffRequest {
        name: "Staff Member".to_string(),
        email: email.to_string(),
        password: Some("welcome-1".to_string()),
        phone: None,
        role,
        department: None,
        specialty: None,
    }
}

#[tokio::test]
async fn staff_list_groups_roles_by_user() {
    let h = harness();
    let clinic_id = seed_clinic(&h.store).await;
    let service = ClinicService::new(&h.state);
    let actor = admin(clinic_id);

    service
        .add_staff(&actor, clinic_id, staff_request("dual@clinic.test", Role::Doctor))
        .await
        .unwrap();
    service
        .add_staff(&actor, clinic_id, staff_request("dual@clinic.test", Role::Admin))
        .await
        .unwrap();

    let groups = service.staff(clinic_id).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].roles.len(), 2);
}

#[tokio::test]
async fn same_role_twice_in_a_clinic_is_rejected() {
    let h = harness();
    let clinic_id = seed_clinic(&h.store).await;
    let service = ClinicService::new(&h.state);
    let actor = admin(clinic_id);

    service
        .add_staff(&actor, clinic_id, staff_request("dup@clinic.test", Role::Doctor))
        .await
        .unwrap();
    let err = service
        .add_staff(&actor, clinic_id, staff_request("dup@clinic.test", Role::Doctor))
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Validation(_));
}

#[tokio::test]
async fn new_staff_account_requires_a_password() {
    let h = harness();
    let clinic_id = seed_clinic(&h.store).await;
    let service = ClinicService::new(&h.state);

    let mut request = staff_request("nopass@clinic.test", Role::Receptionist);
    request.password = None;
    let err = service
        .add_staff(&admin(clinic_id), clinic_id, request)
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Validation(_));
}

#[tokio::test]
async fn removing_staff_keeps_the_user_account() {
    let h = harness();
    let clinic_id = seed_clinic(&h.store).await;
    let service = ClinicService::new(&h.state);
    let actor = admin(clinic_id);

    let group = service
        .add_staff(&actor, clinic_id, staff_request("leaver@clinic.test", Role::Doctor))
        .await
        .unwrap();
    service
        .remove_staff(&actor, clinic_id, group.roles[0].staff_id)
        .await
        .unwrap();

    assert!(service.staff(clinic_id).await.unwrap().is_empty());
    let user = h
        .store
        .user_by_email("leaver@clinic.test")
        .await
        .unwrap();
    assert!(user.is_some());
}

#[tokio::test]
async fn staff_mutations_are_scoped_to_the_clinic() {
    let h = harness();
    let mine = seed_clinic(&h.store).await;
    let theirs = h
        .store
        .create_clinic(NewClinic {
            name: "Other Clinic".to_string(),
            subdomain: "other-clinic".to_string(),
            location: None,
            email: None,
            contact: None,
            modules: Default::default(),
        })
        .await
        .unwrap()
        .id;

    let service = ClinicService::new(&h.state);
    let group = service
        .add_staff(
            &admin(theirs),
            theirs,
            staff_request("foreign@clinic.test", Role::Doctor),
        )
        .await
        .unwrap();

    let err = service
        .update_staff(
            &admin(mine),
            mine,
            group.roles[0].staff_id,
            UpdateStaffRequest {
                role: Some(Role::Admin),
                department: None,
                specialty: None,
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Forbidden(_));
}

#[tokio::test]
async fn department_mutations_are_scoped_to_the_clinic() {
    let h = harness();
    let mine = seed_clinic(&h.store).await;
    let theirs = h
        .store
        .create_clinic(NewClinic {
            name: "Other Clinic".to_string(),
            subdomain: "other-departments".to_string(),
            location: None,
            email: None,
            contact: None,
            modules: Default::default(),
        })
        .await
        .unwrap()
        .id;
    let department = h
        .store
        .create_department(NewDepartment {
            clinic_id: theirs,
            name: "Cardiology".to_string(),
            kind: Some("clinical".to_string()),
        })
        .await
        .unwrap();

    let service = ClinicService::new(&h.state);
    let err = service
        .delete_department(mine, department.id)
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Forbidden(_));
    assert_eq!(service.departments(theirs).await.unwrap().len(), 1);

    service.delete_department(theirs, department.id).await.unwrap();
    assert!(service.departments(theirs).await.unwrap().is_empty());
}

#[tokio::test]
async fn foreign_and_global_templates_cannot_be_deleted() {
    let h = harness();
    let mine = seed_clinic(&h.store).await;
    let global = h
        .store
        .create_template(NewFormTemplate {
            clinic_id: None,
            name: "Global SOAP".to_string(),
            specialty: "general".to_string(),
            fields: serde_json::json!([]),
            status: "published".to_string(),
        })
        .await
        .unwrap();
    let own = h
        .store
        .create_template(NewFormTemplate {
            clinic_id: Some(mine),
            name: "Intake".to_string(),
            specialty: "general".to_string(),
            fields: serde_json::json!([]),
            status: "draft".to_string(),
        })
        .await
        .unwrap();

    let service = ClinicService::new(&h.state);
    let actor = admin(mine);

    let err = service
        .delete_template(&actor, mine, global.id)
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Forbidden(_));

    service.delete_template(&actor, mine, own.id).await.unwrap();
    let remaining = service.templates(mine).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "Global SOAP");
}

#[tokio::test]
async fn notification_updates_are_scoped_and_whitelisted() {
    let h = harness();
    let mine = seed_clinic(&h.store).await;
    let theirs = h
        .store
        .create_clinic(NewClinic {
            name: "Other Clinic".to_string(),
            subdomain: "other-notifications".to_string(),
            location: None,
            email: None,
            contact: None,
            modules: Default::default(),
        })
        .await
        .unwrap()
        .id;
    let notification = h
        .store
        .create_notification(NewNotification {
            clinic_id: theirs,
            department: "pharmacy".to_string(),
            message: serde_json::json!({ "order_id": 1 }),
        })
        .await
        .unwrap();

    let service = ClinicService::new(&h.state);
    let err = service
        .update_notification_status(mine, notification.id, "read")
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Forbidden(_));

    let err = service
        .update_notification_status(theirs, notification.id, "archived")
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Validation(_));

    let updated = service
        .update_notification_status(theirs, notification.id, "read")
        .await
        .unwrap();
    assert_eq!(updated.status, "read");
}

#[tokio::test]
async fn booking_config_defaults_then_round_trips() {
    let h = harness();
    let clinic_id = seed_clinic(&h.store).await;
    let service = ClinicService::new(&h.state);

    let config = service.booking_config(clinic_id).await.unwrap();
    assert_eq!(config.slot_minutes, 30);
    assert!(!config.auto_approve);

    let updated = service
        .update_booking_config(
            &admin(clinic_id),
            clinic_id,
            BookingConfig {
                slot_minutes: 15,
                auto_approve: true,
                ..BookingConfig::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.slot_minutes, 15);

    let read_back = service.booking_config(clinic_id).await.unwrap();
    assert!(read_back.auto_approve);
}

#[tokio::test]
async fn template_listing_includes_global_templates() {
    let h = harness();
    let clinic_id = seed_clinic(&h.store).await;
    h.store
        .create_template(NewFormTemplate {
            clinic_id: None,
            name: "Global SOAP".to_string(),
            specialty: "general".to_string(),
            fields: serde_json::json!([]),
            status: "published".to_string(),
        })
        .await
        .unwrap();

    let templates = ClinicService::new(&h.state).templates(clinic_id).await.unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0].name, "Global SOAP");
}
