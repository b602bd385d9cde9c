use std::future::Future;
use std::pin::Pin;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use shared_database::Store;
use shared_models::{AppError, AuthUser, ClinicContext, ClinicModules, Role};

use crate::state::AppState;

type MiddlewareFuture = Pin<Box<dyn Future<Output = Result<Response, AppError>> + Send>>;

/// Per-route role allow-list, applied with `middleware::from_fn`.
pub fn require_roles(
    allowed: &'static [Role],
) -> impl Fn(Request<Body>, Next) -> MiddlewareFuture + Clone {
    move |request: Request<Body>, next: Next| {
        Box::pin(async move {
            let user = request
                .extensions()
                .get::<AuthUser>()
                .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))?;
            if !allowed.contains(&user.role) {
                return Err(AppError::Forbidden(format!(
                    "Role {} is not permitted here",
                    user.role
                )));
            }
            Ok(next.run(request).await)
        })
    }
}

/// Rejects the request unless the named module is enabled for the resolved
/// clinic. Super-admins bypass the gate entirely.
pub async fn ensure_module(
    store: &dyn Store,
    user: &AuthUser,
    clinic_id: Option<i64>,
    name: &str,
) -> Result<(), AppError> {
    if user.role == Role::SuperAdmin {
        return Ok(());
    }

    let clinic_id = clinic_id.ok_or(AppError::NoClinicContext)?;
    let clinic = store
        .clinic_by_id(clinic_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Clinic not found".to_string()))?;

    let key = ClinicModules::normalize(name);
    if clinic.modules.is_enabled(&key) {
        Ok(())
    } else {
        Err(AppError::ModuleDisabled(key))
    }
}

/// Module gate, applied with `middleware::from_fn_with_state` after the
/// clinic-context layer.
pub fn require_module(
    name: &'static str,
) -> impl Fn(State<AppState>, Request<Body>, Next) -> MiddlewareFuture + Clone {
    move |State(state): State<AppState>, request: Request<Body>, next: Next| {
        Box::pin(async move {
            let user = request
                .extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))?;
            let context = request
                .extensions()
                .get::<ClinicContext>()
                .copied()
                .unwrap_or(ClinicContext(None));

            ensure_module(state.store.as_ref(), &user, context.id(), name).await?;
            Ok(next.run(request).await)
        })
    }
}
