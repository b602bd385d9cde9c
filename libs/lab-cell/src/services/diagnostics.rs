use std::sync::Arc;

use serde_json::json;
use tracing::info;

use shared_database::Store;
use shared_models::{
    AppError, AuthUser, NewAuditEntry, NewInvoice, OrderPatch, OrderType, ServiceOrder,
};
use shared_utils::state::AppState;
use shared_utils::{audit, ids};

use crate::models::{CompleteOrderRequest, CompletionOutcome, DiagnosticsStats};

/// One service covers both diagnostic departments; the order type decides
/// the queue, the invoice prefix and the module gate in front of the router.
pub struct DiagnosticsService {
    store: Arc<dyn Store>,
    order_type: OrderType,
}

impl DiagnosticsService {
    pub fn new(state: &AppState, order_type: OrderType) -> Self {
        Self {
            store: state.store.clone(),
            order_type,
        }
    }

    pub async fn queue(&self, clinic_id: i64) -> Result<Vec<ServiceOrder>, AppError> {
        let mut orders = self
            .store
            .orders_by_clinic(clinic_id, self.order_type)
            .await?;
        orders.retain(|o| o.status == "Ordered");
        Ok(orders)
    }

    pub async fn stats(&self, clinic_id: i64) -> Result<DiagnosticsStats, AppError> {
        let orders = self
            .store
            .orders_by_clinic(clinic_id, self.order_type)
            .await?;
        Ok(DiagnosticsStats {
            queued: orders.iter().filter(|o| o.status == "Ordered").count(),
            completed: orders.iter().filter(|o| o.status == "Completed").count(),
            rejected: orders.iter().filter(|o| o.status == "Rejected").count(),
        })
    }

    /// Attaches the result, closes the order and raises the department
    /// invoice in one pass.
    pub async fn complete_order(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        order_id: i64,
        request: CompleteOrderRequest,
    ) -> Result<CompletionOutcome, AppError> {
        if request.price < 0.0 {
            return Err(AppError::Validation(
                "Price cannot be negative".to_string(),
            ));
        }
        let order = self.open_order(clinic_id, order_id).await?;

        let order = self
            .store
            .update_order(
                order.id,
                OrderPatch {
                    status: Some("Completed".to_string()),
                    result: Some(request.result),
                },
            )
            .await?;

        let invoice = self
            .store
            .create_invoice(NewInvoice {
                id: ids::invoice_number(self.order_type.invoice_prefix()),
                clinic_id,
                patient_id: order.patient_id,
                doctor_id: Some(order.doctor_id),
                service: order.test_name.clone(),
                amount: request.price,
                status: if request.paid { "Paid" } else { "Pending" }.to_string(),
            })
            .await?;

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Diagnostic Order Completed", &actor.email)
                .user(actor.id)
                .clinic(clinic_id)
                .details(json!({
                    "order_id": order.id,
                    "order_type": self.order_type.as_str(),
                    "invoice_id": invoice.id,
                })),
        )
        .await;
        info!(
            "{} order {} completed, invoice {}",
            self.order_type.as_str(),
            order.id,
            invoice.id
        );
        Ok(CompletionOutcome { order, invoice })
    }

    pub async fn reject_order(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        order_id: i64,
    ) -> Result<ServiceOrder, AppError> {
        let order = self.open_order(clinic_id, order_id).await?;
        let order = self
            .store
            .update_order(
                order.id,
                OrderPatch {
                    status: Some("Rejected".to_string()),
                    result: None,
                },
            )
            .await?;

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Diagnostic Order Rejected", &actor.email)
                .user(actor.id)
                .clinic(clinic_id)
                .details(json!({
                    "order_id": order.id,
                    "order_type": self.order_type.as_str(),
                })),
        )
        .await;
        Ok(order)
    }

    async fn open_order(&self, clinic_id: i64, order_id: i64) -> Result<ServiceOrder, AppError> {
        let order = self
            .store
            .order_by_id(order_id)
            .await?
            .filter(|o| o.clinic_id == clinic_id && o.order_type == self.order_type)
            .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
        if order.status != "Ordered" {
            return Err(AppError::Validation(format!(
                "Order {} is already {}",
                order.id, order.status
            )));
        }
        Ok(order)
    }
}
