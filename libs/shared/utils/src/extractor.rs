use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};

use shared_database::Store;
use shared_models::{AppError, AuthUser, ClinicContext, Role};

use crate::jwt::validate_token;
use crate::state::AppState;

/// Verifies the Bearer token, confirms the subject still exists and is
/// active, and attaches `AuthUser` to the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let TypedHeader(auth) = auth.ok_or_else(|| {
        AppError::Auth("Missing or malformed authorization header".to_string())
    })?;

    let claims = validate_token(auth.token(), &state.config.jwt_secret)?;

    let user = state
        .store
        .user_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::Auth("User no longer exists".to_string()))?;
    if user.status != "active" {
        return Err(AppError::Auth("Account is inactive".to_string()));
    }

    request.extensions_mut().insert(AuthUser {
        id: user.id,
        email: user.email,
        role: claims.role,
        clinic_id: claims.clinic_id,
        impersonated_by: claims.impersonated_by,
    });

    Ok(next.run(request).await)
}

/// Resolution order for the effective clinic id:
/// 1. super-admins take the header id if present, else run cross-tenant;
/// 2. a clinic-locked token wins over any header;
/// 3. a header id needs a staff membership, otherwise Forbidden;
/// 4. anything else resolves to no context.
pub async fn resolve_clinic(
    store: &dyn Store,
    user: &AuthUser,
    header_clinic: Option<i64>,
) -> Result<Option<i64>, AppError> {
    if user.role == Role::SuperAdmin {
        return Ok(header_clinic);
    }

    if let Some(locked) = user.clinic_id {
        return Ok(Some(locked));
    }

    if let Some(requested) = header_clinic {
        let membership = store.membership(user.id, requested).await?;
        if membership.is_none() {
            return Err(AppError::Forbidden(
                "You do not have access to this clinic".to_string(),
            ));
        }
        return Ok(Some(requested));
    }

    Ok(None)
}

/// Attaches `ClinicContext` to the request. Handlers that need a tenant call
/// `ClinicContext::require()`, which turns an unresolved context into
/// `NoClinicContext`.
pub async fn clinic_context_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))?;

    let header_clinic = request
        .headers()
        .get("x-clinic-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<i64>().ok());

    let resolved = resolve_clinic(state.store.as_ref(), &user, header_clinic).await?;
    request.extensions_mut().insert(ClinicContext(resolved));

    Ok(next.run(request).await)
}
