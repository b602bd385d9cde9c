use std::sync::Arc;

use assert_matches::assert_matches;

use shared_config::AppConfig;
use shared_database::{MemoryStore, Store};
use shared_models::{AppError, AuthUser, ClinicModules, NewStaff, NewUser, Role};
use shared_utils::jwt;
use shared_utils::state::AppState;
use super_cell::models::{CreateClinicRequest, ProvisionAdminRequest};
use super_cell::services::{ImpersonationService, SuperAdminService};

struct Harness {
    store: Arc<MemoryStore>,
    state: AppState,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(AppConfig::default(), store.clone());
    Harness { store, state }
}

fn root() -> AuthUser {
    AuthUser {
        id: 1,
        email: "root@system.test".to_string(),
        role: Role::SuperAdmin,
        clinic_id: None,
        impersonated_by: None,
    }
}

async fn seed_user(store: &MemoryStore, email: &str, role: Role) -> i64 {
    store
        .create_user(NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            name: "Someone".to_string(),
            phone: None,
            role,
        })
        .await
        .unwrap()
        .id
}

fn clinic_request(name: &str) -> CreateClinicRequest {
    CreateClinicRequest {
        name: name.to_string(),
        subdomain: None,
        location: None,
        email: None,
        contact: None,
        modules: None,
    }
}

#[tokio::test]
async fn clinic_names_are_slugified_for_subdomains() {
    let h = harness();
    let service = SuperAdminService::new(&h.state);

    let clinic = service
        .create_clinic(&root(), clinic_request("St. Mary's Family Care!"))
        .await
        .unwrap();
    assert_eq!(clinic.subdomain, "st-mary-s-family-care");
    assert_eq!(clinic.modules.enabled_count(), 2);
}

#[tokio::test]
async fn duplicate_subdomain_is_a_conflict() {
    let h = harness();
    let service = SuperAdminService::new(&h.state);

    service
        .create_clinic(&root(), clinic_request("City Clinic"))
        .await
        .unwrap();
    let err = service
        .create_clinic(&root(), clinic_request("City Clinic"))
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Conflict(_));
}

#[tokio::test]
async fn status_toggle_flips_between_active_and_inactive() {
    let h = harness();
    let service = SuperAdminService::new(&h.state);
    let clinic = service
        .create_clinic(&root(), clinic_request("Toggle Clinic"))
        .await
        .unwrap();

    let toggled = service
        .toggle_clinic_status(&root(), clinic.id)
        .await
        .unwrap();
    assert_eq!(toggled.status, "inactive");

    let toggled = service
        .toggle_clinic_status(&root(), clinic.id)
        .await
        .unwrap();
    assert_eq!(toggled.status, "active");
}

#[tokio::test]
async fn provisioning_the_same_admin_twice_is_rejected() {
    let h = harness();
    let service = SuperAdminService::new(&h.state);
    let clinic = service
        .create_clinic(&root(), clinic_request("Admin Clinic"))
        .await
        .unwrap();

    let request = || ProvisionAdminRequest {
        name: "Clinic Admin".to_string(),
        email: "admin@clinic.test".to_string(),
        password: "initial-pass".to_string(),
        phone: None,
    };

    let row = service
        .provision_admin(&root(), clinic.id, request())
        .await
        .unwrap();
    assert_eq!(row.role, Role::Admin);

    let err = service
        .provision_admin(&root(), clinic.id, request())
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Validation(_));
}

#[tokio::test]
async fn impersonating_a_missing_user_is_not_found() {
    let h = harness();
    let err = ImpersonationService::new(&h.state)
        .impersonate_user(&root(), 404)
        .await
        .unwrap_err();
    assert_matches!(err, AppError::NotFound(_));
}

#[tokio::test]
async fn impersonating_a_super_admin_is_an_invalid_target() {
    let h = harness();
    let target = seed_user(&h.store, "other-root@system.test", Role::SuperAdmin).await;

    let err = ImpersonationService::new(&h.state)
        .impersonate_user(&root(), target)
        .await
        .unwrap_err();
    assert_matches!(err, AppError::InvalidTarget(_));
}

#[tokio::test]
async fn impersonation_token_carries_the_actor() {
    let h = harness();
    let target = seed_user(&h.store, "doc@clinic.test", Role::Doctor).await;

    let grant = ImpersonationService::new(&h.state)
        .impersonate_user(&root(), target)
        .await
        .unwrap();

    let claims = jwt::validate_token(&grant.token, "secret").unwrap();
    assert_eq!(claims.sub, target);
    assert_eq!(claims.role, Role::Doctor);
    assert_eq!(claims.impersonated_by.as_deref(), Some("root@system.test"));
}

#[tokio::test]
async fn clinic_impersonation_prefers_an_admin_and_needs_staff() {
    let h = harness();
    let service = SuperAdminService::new(&h.state);
    let clinic = service
        .create_clinic(&root(), clinic_request("Staffed Clinic"))
        .await
        .unwrap();
    let empty = service
        .create_clinic(&root(), clinic_request("Empty Clinic"))
        .await
        .unwrap();

    let doctor = seed_user(&h.store, "doctor@staffed.test", Role::Receptionist).await;
    let admin = seed_user(&h.store, "admin@staffed.test", Role::Receptionist).await;
    for (user_id, role) in [(doctor, Role::Doctor), (admin, Role::Admin)] {
        h.store
            .create_staff(NewStaff {
                user_id,
                clinic_id: clinic.id,
                role,
                department: None,
                specialty: None,
            })
            .await
            .unwrap();
    }

    let impersonation = ImpersonationService::new(&h.state);
    let grant = impersonation
        .impersonate_clinic(&root(), clinic.id)
        .await
        .unwrap();
    assert_eq!(grant.role, Role::Admin);
    assert_eq!(grant.acting_as, "admin@staffed.test");
    assert_eq!(grant.clinic_id, Some(clinic.id));

    let err = impersonation
        .impersonate_clinic(&root(), empty.id)
        .await
        .unwrap_err();
    assert_matches!(err, AppError::NoStaffFound);
}

#[tokio::test]
async fn dashboard_counts_clinics_admins_and_modules() {
    let h = harness();
    let service = SuperAdminService::new(&h.state);

    let clinic = service
        .create_clinic(&root(), clinic_request("Stats Clinic"))
        .await
        .unwrap();
    let admin = seed_user(&h.store, "stats-admin@clinic.test", Role::Receptionist).await;
    h.store
        .create_staff(NewStaff {
            user_id: admin,
            clinic_id: clinic.id,
            role: Role::Admin,
            department: None,
            specialty: None,
        })
        .await
        .unwrap();

    let stats = service.dashboard().await.unwrap();
    assert_eq!(stats.clinics, 1);
    assert_eq!(stats.admins, 1);
    assert_eq!(
        stats.active_modules,
        ClinicModules::default().enabled_count()
    );
}
