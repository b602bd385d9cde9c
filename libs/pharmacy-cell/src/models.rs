use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shared_models::{Invoice, InventoryItem, ServiceOrder, StockLine};

#[derive(Debug, Deserialize)]
pub struct AddInventoryRequest {
    pub name: String,
    pub sku: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInventoryRequest {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<f64>,
    pub expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ProcessOrderRequest {
    pub lines: Vec<StockLine>,
    #[serde(default)]
    pub paid: bool,
}

#[derive(Debug, Deserialize)]
pub struct DirectSaleRequest {
    pub patient_id: i64,
    pub lines: Vec<StockLine>,
    #[serde(default)]
    pub paid: bool,
}

#[derive(Debug, Serialize)]
pub struct DispenseOutcome {
    pub order: Option<ServiceOrder>,
    pub invoice: Invoice,
    pub items: Vec<InventoryItem>,
}
