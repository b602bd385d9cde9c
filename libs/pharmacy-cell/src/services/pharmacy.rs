use std::sync::Arc;

use serde_json::json;
use tracing::info;

use shared_database::Store;
use shared_models::{
    AppError, AuthUser, InventoryItem, InventoryPatch, NewAuditEntry, NewInventoryItem,
    NewInvoice, OrderPatch, OrderType, ServiceOrder, StockLine,
};
use shared_utils::state::AppState;
use shared_utils::{audit, ids};

use crate::models::{
    AddInventoryRequest, DirectSaleRequest, DispenseOutcome, ProcessOrderRequest,
    UpdateInventoryRequest,
};

pub struct PharmacyService {
    store: Arc<dyn Store>,
}

impl PharmacyService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    pub async fn inventory(&self, clinic_id: i64) -> Result<Vec<InventoryItem>, AppError> {
        self.store.inventory_by_clinic(clinic_id).await
    }

    pub async fn add_item(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        request: AddInventoryRequest,
    ) -> Result<InventoryItem, AppError> {
        if request.quantity < 0 || request.unit_price < 0.0 {
            return Err(AppError::Validation(
                "Quantity and unit price cannot be negative".to_string(),
            ));
        }
        let item = self
            .store
            .create_inventory_item(NewInventoryItem {
                clinic_id,
                name: request.name,
                sku: request.sku,
                quantity: request.quantity,
                unit_price: request.unit_price,
                expiry_date: request.expiry_date,
            })
            .await?;

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Inventory Item Added", &actor.email)
                .user(actor.id)
                .clinic(clinic_id)
                .details(json!({ "inventory_id": item.id, "name": item.name })),
        )
        .await;
        Ok(item)
    }

    pub async fn update_item(
        &self,
        clinic_id: i64,
        item_id: i64,
        request: UpdateInventoryRequest,
    ) -> Result<InventoryItem, AppError> {
        self.store
            .inventory_item(item_id)
            .await?
            .filter(|i| i.clinic_id == clinic_id)
            .ok_or_else(|| AppError::NotFound("Inventory item not found".to_string()))?;

        self.store
            .update_inventory_item(
                item_id,
                InventoryPatch {
                    name: request.name,
                    sku: request.sku,
                    quantity: request.quantity,
                    unit_price: request.unit_price,
                    expiry_date: request.expiry_date,
                },
            )
            .await
    }

    pub async fn order_queue(&self, clinic_id: i64) -> Result<Vec<ServiceOrder>, AppError> {
        let mut orders = self
            .store
            .orders_by_clinic(clinic_id, OrderType::Pharmacy)
            .await?;
        orders.retain(|o| o.status == "Ordered");
        Ok(orders)
    }

    /// Fills a doctor's pharmacy order: deduct every requested line, mark the
    /// order completed, and raise the RX invoice. Stock is deducted all or
    /// nothing, so a short line leaves both the order and the shelf untouched.
    pub async fn process_order(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        order_id: i64,
        request: ProcessOrderRequest,
    ) -> Result<DispenseOutcome, AppError> {
        let order = self
            .store
            .order_by_id(order_id)
            .await?
            .filter(|o| o.clinic_id == clinic_id && o.order_type == OrderType::Pharmacy)
            .ok_or_else(|| AppError::NotFound("Pharmacy order not found".to_string()))?;
        if order.status != "Ordered" {
            return Err(AppError::Validation(format!(
                "Order {} is already {}",
                order.id, order.status
            )));
        }

        let (items, total) = self.dispense(clinic_id, &request.lines).await?;
        let order = self
            .store
            .update_order(
                order.id,
                OrderPatch {
                    status: Some("Completed".to_string()),
                    result: None,
                },
            )
            .await?;
        let invoice = self
            .invoice_for(actor, clinic_id, order.patient_id, total, request.paid)
            .await?;

        info!("Pharmacy order {} dispensed, invoice {}", order.id, invoice.id);
        Ok(DispenseOutcome {
            order: Some(order),
            invoice,
            items,
        })
    }

    /// Over-the-counter sale with no doctor order behind it.
    pub async fn direct_sale(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        request: DirectSaleRequest,
    ) -> Result<DispenseOutcome, AppError> {
        let patient = self
            .store
            .patient_by_id(request.patient_id)
            .await?
            .filter(|p| p.clinic_id == clinic_id)
            .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))?;

        let (items, total) = self.dispense(clinic_id, &request.lines).await?;
        let invoice = self
            .invoice_for(actor, clinic_id, patient.id, total, request.paid)
            .await?;

        Ok(DispenseOutcome {
            order: None,
            invoice,
            items,
        })
    }

    /// Prices the lines, then deducts the stock atomically. Returns the
    /// refreshed items and the billable total.
    async fn dispense(
        &self,
        clinic_id: i64,
        lines: &[StockLine],
    ) -> Result<(Vec<InventoryItem>, f64), AppError> {
        if lines.is_empty() {
            return Err(AppError::Validation(
                "At least one stock line is required".to_string(),
            ));
        }

        let mut total = 0.0;
        for line in lines {
            if line.quantity <= 0 {
                return Err(AppError::Validation(
                    "Line quantity must be positive".to_string(),
                ));
            }
            let item = self
                .store
                .inventory_item(line.inventory_id)
                .await?
                .filter(|i| i.clinic_id == clinic_id)
                .ok_or_else(|| AppError::NotFound("Inventory item not found".to_string()))?;
            total += line.price.unwrap_or(item.unit_price) * line.quantity as f64;
        }

        self.store.deduct_stock(clinic_id, lines).await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            if let Some(item) = self.store.inventory_item(line.inventory_id).await? {
                items.push(item);
            }
        }
        Ok((items, total))
    }

    async fn invoice_for(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        patient_id: i64,
        total: f64,
        paid: bool,
    ) -> Result<shared_models::Invoice, AppError> {
        let invoice = self
            .store
            .create_invoice(NewInvoice {
                id: ids::invoice_number(OrderType::Pharmacy.invoice_prefix()),
                clinic_id,
                patient_id,
                doctor_id: None,
                service: "Pharmacy".to_string(),
                amount: total,
                status: if paid { "Paid" } else { "Pending" }.to_string(),
            })
            .await?;

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Medication Dispensed", &actor.email)
                .user(actor.id)
                .clinic(clinic_id)
                .details(json!({ "invoice_id": invoice.id, "amount": invoice.amount })),
        )
        .await;
        Ok(invoice)
    }
}
