use std::sync::Arc;

use chrono::{DateTime, Utc};

use shared_config::AppConfig;
use shared_database::Store;

/// Shared application state handed to every router. The store is the injected
/// persistence gateway; handlers and services never construct their own.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            started_at: Utc::now(),
        }
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
