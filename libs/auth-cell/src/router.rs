use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_utils::extractor::auth_middleware;
use shared_utils::state::AppState;

use crate::handlers::*;

pub fn create_auth_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password));

    let protected = Router::new()
        .route("/clinics/my", get(my_clinics))
        .route("/select-clinic", post(select_clinic))
        .route("/change-password", post(change_password))
        .route("/refresh-token", post(refresh_token))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    public.merge(protected).with_state(state)
}
