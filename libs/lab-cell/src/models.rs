use serde::{Deserialize, Serialize};
use serde_json::Value;

use shared_models::{Invoice, ServiceOrder};

#[derive(Debug, Deserialize)]
pub struct CompleteOrderRequest {
    pub result: Value,
    pub price: f64,
    #[serde(default)]
    pub paid: bool,
}

#[derive(Debug, Serialize)]
pub struct CompletionOutcome {
    pub order: ServiceOrder,
    pub invoice: Invoice,
}

#[derive(Debug, Serialize)]
pub struct DiagnosticsStats {
    pub queued: usize,
    pub completed: usize,
    pub rejected: usize,
}
