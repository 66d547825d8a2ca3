//! Builds the concrete instance of a due recurring document and advances the
//! source schedule.

use crate::models::{
    next_occurrence, Expense, Frequency, Invoice, InvoiceStatus, NewExpense, NewInvoice,
    NewLineItem,
};
use crate::services::clock::Clock;
use crate::services::metrics::DOCUMENTS_GENERATED_TOTAL;
use crate::services::store::DocumentStore;
use chrono::Duration;
use ops_core::error::AppError;
use std::sync::Arc;
use tracing::info;

pub struct DocumentGenerator {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    due_term_days: i64,
}

impl DocumentGenerator {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>, due_term_days: i64) -> Self {
        Self {
            store,
            clock,
            due_term_days,
        }
    }

    /// Copy a due recurring invoice into a fresh unpaid instance and move
    /// the series one step forward, both in one store transaction.
    pub async fn generate_invoice(&self, source: &Invoice) -> Result<Invoice, AppError> {
        let anchor = source.next_run_date.ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Recurring invoice {} has no next run date",
                source.invoice_id
            ))
        })?;

        let items: Vec<NewLineItem> = self
            .store
            .line_items(source.invoice_id)
            .await?
            .into_iter()
            .map(|item| NewLineItem {
                description: item.description,
                price: item.price,
                product_id: item.product_id,
            })
            .collect();

        let copy = NewInvoice {
            owner_id: source.owner_id,
            client_id: source.client_id,
            amount: source.amount,
            due_date: (self.clock.now() + Duration::days(self.due_term_days)).date_naive(),
            status: InvoiceStatus::Unpaid,
            items,
            is_recurring: false,
            frequency: Frequency::default(),
            next_run_date: None,
        };

        // Advance from the previous run date, not from now: scheduler
        // latency must not drift the cadence.
        let next_run = next_occurrence(anchor, source.frequency);
        let generated = self
            .store
            .generate_invoice(source.invoice_id, &copy, next_run)
            .await?;

        DOCUMENTS_GENERATED_TOTAL
            .with_label_values(&["invoice"])
            .inc();
        info!(
            source_id = %source.invoice_id,
            invoice_id = %generated.invoice_id,
            client_id = %source.client_id,
            next_run = %next_run,
            "Generated recurring invoice"
        );

        Ok(generated)
    }

    /// Expense counterpart of [`DocumentGenerator::generate_invoice`]; the
    /// copy is dated at the processing day.
    pub async fn generate_expense(&self, source: &Expense) -> Result<Expense, AppError> {
        let anchor = source.next_run_date.ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "Recurring expense {} has no next run date",
                source.expense_id
            ))
        })?;

        let copy = NewExpense {
            owner_id: source.owner_id,
            description: source.description.clone(),
            amount: source.amount,
            category: source.category,
            spent_on: self.clock.now().date_naive(),
            is_recurring: false,
            frequency: Frequency::default(),
            next_run_date: None,
        };

        let next_run = next_occurrence(anchor, source.frequency);
        let generated = self
            .store
            .generate_expense(source.expense_id, &copy, next_run)
            .await?;

        DOCUMENTS_GENERATED_TOTAL
            .with_label_values(&["expense"])
            .inc();
        info!(
            source_id = %source.expense_id,
            expense_id = %generated.expense_id,
            description = %generated.description,
            next_run = %next_run,
            "Generated recurring expense"
        );

        Ok(generated)
    }
}
