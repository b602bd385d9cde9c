use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub patient_id: i64,
    pub doctor_id: Option<i64>,
    pub service: String,
    pub amount: f64,
    #[serde(default)]
    pub paid: bool,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct BillingStats {
    pub invoices: usize,
    pub pending: usize,
    pub collected: f64,
}
