use serde::{Deserialize, Serialize};
use serde_json::Value;

use shared_models::{MedicalRecord, OrderType, ServiceOrder};

#[derive(Debug, Serialize)]
pub struct DoctorStats {
    pub queue_today: usize,
    pub completed_today: usize,
    pub patients_seen: usize,
    pub revenue: f64,
}

#[derive(Debug, Serialize)]
pub struct RevenueSummary {
    pub consultations: usize,
    pub consultation_fee: f64,
    pub total: f64,
}

/// A lab, radiology or pharmacy request embedded in an assessment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddedOrder {
    pub order_type: OrderType,
    pub test_name: String,
    pub details: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct SaveAssessmentRequest {
    pub patient_id: i64,
    pub template_id: Option<i64>,
    pub record_type: Option<String>,
    pub data: Value,
    #[serde(default)]
    pub orders: Vec<EmbeddedOrder>,
}

#[derive(Debug, Serialize)]
pub struct AssessmentOutcome {
    pub record: MedicalRecord,
    pub orders: Vec<ServiceOrder>,
    pub completed_appointments: u64,
}
