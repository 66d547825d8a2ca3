//! Invoice and expense creation entry points.

use crate::dtos::{CreateExpenseRequest, CreateInvoiceRequest};
use crate::error::EngineError;
use crate::models::{
    next_occurrence, Expense, ExpenseCategory, Frequency, Invoice, InvoiceStatus, NewExpense,
    NewInvoice, NewLineItem,
};
use crate::services::clock::Clock;
use crate::services::inventory::InventoryLedger;
use crate::services::store::DocumentStore;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use ops_core::error::AppError;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Creation entry points for the two recurring-capable document kinds.
///
/// Validation happens before any stock or store effect; a failed invoice
/// write releases whatever the ledger reserved for it.
pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    ledger: InventoryLedger,
    clock: Arc<dyn Clock>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        let ledger = InventoryLedger::new(store.clone());
        Self {
            store,
            ledger,
            clock,
        }
    }

    pub async fn create_invoice(
        &self,
        owner_id: Uuid,
        request: CreateInvoiceRequest,
    ) -> Result<Invoice, EngineError> {
        request.validate()?;
        let client_id = required(request.client_id, "client_id")?;
        let amount = required(request.amount, "amount")?;
        let due_date = required(request.due_date, "due_date")?;

        let status = request
            .status
            .as_deref()
            .map(InvoiceStatus::from_string)
            .unwrap_or_default();
        let frequency = request
            .frequency
            .as_deref()
            .map(Frequency::from_string)
            .unwrap_or_default();
        let items: Vec<NewLineItem> = request
            .items
            .iter()
            .map(|item| NewLineItem {
                description: item.description.clone(),
                price: item.price,
                product_id: item.product_id,
            })
            .collect();

        let taken = self.ledger.reserve(owner_id, &items).await?;

        // A recurring series anchors on the due date and starts one step
        // out, so the first regeneration lands a full period later.
        let next_run_date = request
            .is_recurring
            .then(|| next_occurrence(start_of_day(due_date), frequency));

        let input = NewInvoice {
            owner_id,
            client_id,
            amount,
            due_date,
            status,
            items,
            is_recurring: request.is_recurring,
            frequency,
            next_run_date,
        };

        match self.store.insert_invoice(&input).await {
            Ok(invoice) => {
                info!(
                    invoice_id = %invoice.invoice_id,
                    client_id = %client_id,
                    recurring = invoice.is_recurring,
                    "Invoice created"
                );
                Ok(invoice)
            }
            Err(e) => {
                self.ledger.release(&taken).await;
                Err(e.into())
            }
        }
    }

    pub async fn create_expense(
        &self,
        owner_id: Uuid,
        request: CreateExpenseRequest,
    ) -> Result<Expense, EngineError> {
        request.validate()?;
        let description = required(request.description, "description")?;
        let amount = required(request.amount, "amount")?;
        let category = ExpenseCategory::from_string(&required(request.category, "category")?);

        let spent_on = request
            .spent_on
            .unwrap_or_else(|| self.clock.now().date_naive());
        let frequency = request
            .frequency
            .as_deref()
            .map(Frequency::from_string)
            .unwrap_or_default();
        let next_run_date = request
            .is_recurring
            .then(|| next_occurrence(start_of_day(spent_on), frequency));

        let input = NewExpense {
            owner_id,
            description,
            amount,
            category,
            spent_on,
            is_recurring: request.is_recurring,
            frequency,
            next_run_date,
        };

        let expense = self.store.insert_expense(&input).await?;
        info!(
            expense_id = %expense.expense_id,
            category = category.as_str(),
            recurring = expense.is_recurring,
            "Expense created"
        );
        Ok(expense)
    }
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, EngineError> {
    value.ok_or_else(|| {
        EngineError::Store(AppError::InternalError(anyhow::anyhow!(
            "{} missing after validation",
            field
        )))
    })
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}
