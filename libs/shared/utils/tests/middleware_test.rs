use assert_matches::assert_matches;

use shared_database::{MemoryStore, Store};
use shared_models::{
    AppError, AuthUser, ClinicModules, NewClinic, NewStaff, Role,
};
use shared_utils::{ensure_module, resolve_clinic};

fn auth_user(id: i64, role: Role, clinic_id: Option<i64>) -> AuthUser {
    AuthUser {
        id,
        email: format!("user{}@clinic.test", id),
        role,
        clinic_id,
        impersonated_by: None,
    }
}

async fn seed_clinic(store: &MemoryStore, modules: ClinicModules) -> i64 {
    store
        .create_clinic(NewClinic {
            name: "City Clinic".to_string(),
            subdomain: "city-clinic".to_string(),
            location: None,
            email: None,
            contact: None,
            modules,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn super_admin_takes_the_header_or_runs_cross_tenant() {
    let store = MemoryStore::new();
    let admin = auth_user(1, Role::SuperAdmin, None);

    let with_header = resolve_clinic(&store, &admin, Some(9)).await.unwrap();
    assert_eq!(with_header, Some(9));

    let without = resolve_clinic(&store, &admin, None).await.unwrap();
    assert_eq!(without, None);
}

#[tokio::test]
async fn locked_token_wins_over_the_header() {
    let store = MemoryStore::new();
    let doctor = auth_user(2, Role::Doctor, Some(4));

    let resolved = resolve_clinic(&store, &doctor, Some(9)).await.unwrap();
    assert_eq!(resolved, Some(4));
}

#[tokio::test]
async fn header_clinic_requires_membership() {
    let store = MemoryStore::new();
    let clinic_id = seed_clinic(&store, ClinicModules::default()).await;
    store
        .create_staff(NewStaff {
            user_id: 3,
            clinic_id,
            role: Role::Doctor,
            department: None,
            specialty: None,
        })
        .await
        .unwrap();

    let member = auth_user(3, Role::Doctor, None);
    let resolved = resolve_clinic(&store, &member, Some(clinic_id)).await.unwrap();
    assert_eq!(resolved, Some(clinic_id));

    let outsider = auth_user(4, Role::Doctor, None);
    let err = resolve_clinic(&store, &outsider, Some(clinic_id))
        .await
        .unwrap_err();
    assert_matches!(err, AppError::Forbidden(_));
}

#[tokio::test]
async fn no_header_and_no_lock_resolves_to_nothing() {
    let store = MemoryStore::new();
    let doctor = auth_user(5, Role::Doctor, None);

    let resolved = resolve_clinic(&store, &doctor, None).await.unwrap();
    assert_eq!(resolved, None);
}

#[tokio::test]
async fn module_gate_normalizes_aliases() {
    let store = MemoryStore::new();
    let clinic_id = seed_clinic(
        &store,
        ClinicModules {
            laboratory: true,
            ..ClinicModules::default()
        },
    )
    .await;
    let user = auth_user(6, Role::Admin, Some(clinic_id));

    ensure_module(&store, &user, Some(clinic_id), "Lab")
        .await
        .unwrap();
    ensure_module(&store, &user, Some(clinic_id), "laboratory")
        .await
        .unwrap();

    let err = ensure_module(&store, &user, Some(clinic_id), "xray")
        .await
        .unwrap_err();
    assert_matches!(err, AppError::ModuleDisabled(name) if name == "radiology");
}

#[tokio::test]
async fn module_gate_needs_a_clinic_unless_super_admin() {
    let store = MemoryStore::new();

    let admin = auth_user(7, Role::Admin, None);
    let err = ensure_module(&store, &admin, None, "pharmacy")
        .await
        .unwrap_err();
    assert_matches!(err, AppError::NoClinicContext);

    let super_admin = auth_user(8, Role::SuperAdmin, None);
    ensure_module(&store, &super_admin, None, "pharmacy")
        .await
        .unwrap();
}
