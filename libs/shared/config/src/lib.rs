use std::env;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub port: u16,
    pub allowed_origin: String,
    pub environment: String,
    pub captcha_answer: String,
    pub postgrest_url: String,
    pub postgrest_api_key: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            jwt_secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JWT_SECRET not set, using insecure default");
                    "secret".to_string()
                }),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            allowed_origin: env::var("ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
            captcha_answer: env::var("CAPTCHA_ANSWER")
                .unwrap_or_else(|_| "1234".to_string()),
            postgrest_url: env::var("POSTGREST_URL")
                .unwrap_or_else(|_| {
                    warn!("POSTGREST_URL not set, using empty value");
                    String::new()
                }),
            postgrest_api_key: env::var("POSTGREST_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("POSTGREST_API_KEY not set, using empty value");
                    String::new()
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        self.jwt_secret != "secret" && !self.postgrest_url.is_empty()
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "secret".to_string(),
            port: 5000,
            allowed_origin: "http://localhost:5173".to_string(),
            environment: "development".to_string(),
            captcha_answer: "1234".to_string(),
            postgrest_url: String::new(),
            postgrest_api_key: String::new(),
        }
    }
}
