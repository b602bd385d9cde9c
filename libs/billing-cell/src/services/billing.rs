use std::sync::Arc;

use serde_json::json;
use tracing::info;

use shared_database::Store;
use shared_models::{AppError, AuthUser, Invoice, NewAuditEntry, NewInvoice};
use shared_utils::state::AppState;
use shared_utils::{audit, ids};

use crate::models::{BillingStats, CreateInvoiceRequest, InvoiceStatusRequest};

const INVOICE_STATUSES: &[&str] = &["Pending", "Paid", "Cancelled"];

pub struct BillingService {
    store: Arc<dyn Store>,
}

impl BillingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    pub async fn invoices(&self, clinic_id: i64) -> Result<Vec<Invoice>, AppError> {
        self.store.invoices_by_clinic(clinic_id).await
    }

    pub async fn stats(&self, clinic_id: i64) -> Result<BillingStats, AppError> {
        let invoices = self.store.invoices_by_clinic(clinic_id).await?;
        Ok(BillingStats {
            invoices: invoices.len(),
            pending: invoices.iter().filter(|i| i.status == "Pending").count(),
            collected: self.store.paid_invoice_total(clinic_id).await?,
        })
    }

    pub async fn create_invoice(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        request: CreateInvoiceRequest,
    ) -> Result<Invoice, AppError> {
        if request.amount < 0.0 {
            return Err(AppError::Validation(
                "Invoice amount cannot be negative".to_string(),
            ));
        }
        let patient = self
            .store
            .patient_by_id(request.patient_id)
            .await?
            .filter(|p| p.clinic_id == clinic_id)
            .ok_or_else(|| AppError::NotFound("Patient not found".to_string()))?;

        let invoice = self
            .store
            .create_invoice(NewInvoice {
                id: ids::invoice_number("INV"),
                clinic_id,
                patient_id: patient.id,
                doctor_id: request.doctor_id,
                service: request.service,
                amount: request.amount,
                status: if request.paid { "Paid" } else { "Pending" }.to_string(),
            })
            .await?;

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Invoice Created", &actor.email)
                .user(actor.id)
                .clinic(clinic_id)
                .details(json!({ "invoice_id": invoice.id, "amount": invoice.amount })),
        )
        .await;
        info!("Invoice {} created for patient {}", invoice.id, patient.id);
        Ok(invoice)
    }

    pub async fn update_status(
        &self,
        actor: &AuthUser,
        clinic_id: i64,
        invoice_id: &str,
        request: InvoiceStatusRequest,
    ) -> Result<Invoice, AppError> {
        if !INVOICE_STATUSES.contains(&request.status.as_str()) {
            return Err(AppError::Validation(format!(
                "Unknown invoice status '{}'",
                request.status
            )));
        }
        let invoices = self.store.invoices_by_clinic(clinic_id).await?;
        if !invoices.iter().any(|i| i.id == invoice_id) {
            return Err(AppError::Forbidden(
                "Invoice belongs to another clinic".to_string(),
            ));
        }

        let invoice = self
            .store
            .update_invoice_status(invoice_id, &request.status)
            .await?;

        audit::record(
            self.store.as_ref(),
            NewAuditEntry::new("Invoice Status Updated", &actor.email)
                .user(actor.id)
                .clinic(clinic_id)
                .details(json!({ "invoice_id": invoice.id, "status": invoice.status })),
        )
        .await;
        Ok(invoice)
    }
}
