use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared_models::{AppError, Claims, Role};

type HmacSha256 = Hmac<Sha256>;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

fn mac(secret: &str) -> Result<HmacSha256, AppError> {
    HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Internal("Failed to create HMAC".to_string()))
}

/// Builds and signs a token for a session. `ttl` controls the expiry window:
/// one hour for login and refresh, eight for a selected clinic, four for an
/// impersonation session.
pub fn issue(
    user_id: i64,
    role: Role,
    clinic_id: Option<i64>,
    impersonated_by: Option<String>,
    ttl: Duration,
    secret: &str,
) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        role,
        clinic_id,
        impersonated_by,
        iat: now,
        exp: now + ttl.num_seconds(),
    };
    sign_token(&claims, secret)
}

pub fn sign_token(claims: &Claims, secret: &str) -> Result<String, AppError> {
    if secret.is_empty() {
        return Err(AppError::Internal("JWT secret is not set".to_string()));
    }

    let header_b64 = URL_SAFE_NO_PAD.encode(HEADER);
    let claims_json = serde_json::to_string(claims)?;
    let claims_b64 = URL_SAFE_NO_PAD.encode(claims_json);

    let signing_input = format!("{}.{}", header_b64, claims_b64);
    let mut mac = mac(secret)?;
    mac.update(signing_input.as_bytes());
    let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature_b64))
}

pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    if secret.is_empty() {
        return Err(AppError::Auth("JWT secret is not set".to_string()));
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AppError::Auth("Invalid token format".to_string()));
    }
    let (header_b64, claims_b64, signature_b64) = (parts[0], parts[1], parts[2]);

    let signature = URL_SAFE_NO_PAD.decode(signature_b64).map_err(|e| {
        debug!("Failed to decode signature: {}", e);
        AppError::Auth("Invalid signature encoding".to_string())
    })?;

    let signing_input = format!("{}.{}", header_b64, claims_b64);
    let mut mac = mac(secret).map_err(|_| AppError::Auth("Failed to create HMAC".to_string()))?;
    mac.update(signing_input.as_bytes());
    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err(AppError::Auth("Invalid token signature".to_string()));
    }

    let claims_bytes = URL_SAFE_NO_PAD
        .decode(claims_b64)
        .map_err(|_| AppError::Auth("Invalid claims encoding".to_string()))?;
    let claims: Claims = serde_json::from_slice(&claims_bytes).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        AppError::Auth("Invalid claims format".to_string())
    })?;

    if claims.exp < Utc::now().timestamp() {
        debug!("Token expired at {}", claims.exp);
        return Err(AppError::Auth("Token expired".to_string()));
    }

    Ok(claims)
}
