//! Scheduler integration tests for recurring-service.

mod common;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{date, datetime, expense_request, recurring_invoice_request, service_line, TestEngine};
use ops_core::error::AppError;
use recurring_service::models::{
    Expense, Invoice, InvoiceStatus, LineItem, NewExpense, NewInvoice, Product,
};
use recurring_service::services::metrics::gather_metrics;
use recurring_service::services::store::{DocumentStore, DuePage, MemoryStore};
use recurring_service::workers::RecurrenceScheduler;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn tick_copies_a_due_invoice_and_advances_the_schedule() {
    let engine = TestEngine::spawn();

    // Due on 2025-06-01, monthly: the schedule sits at 2025-07-01, in the
    // past relative to the test clock (2025-07-15).
    let mut request =
        recurring_invoice_request(engine.client_id(), 500, date(2025, 6, 1), "monthly");
    request.items = vec![service_line("Retainer", 500)];
    let source = engine
        .documents
        .create_invoice(engine.owner_id(), request)
        .await
        .unwrap();
    assert_eq!(source.next_run_date, Some(datetime(2025, 7, 1, 0, 0, 0)));

    engine.scheduler.tick().await;

    let invoices = engine.store.invoices().await;
    assert_eq!(invoices.len(), 2, "one tick generates exactly one copy");

    let copy = invoices
        .iter()
        .find(|invoice| invoice.invoice_id != source.invoice_id)
        .expect("generated copy should exist");
    assert!(!copy.is_recurring);
    assert_eq!(copy.next_run_date, None);
    assert_eq!(copy.status, InvoiceStatus::Unpaid);
    assert_eq!(copy.client_id, source.client_id);
    assert_eq!(copy.amount, source.amount);
    // 30-day term from the processing time.
    assert_eq!(copy.due_date, date(2025, 8, 14));

    let copied_items = engine.store.line_items(copy.invoice_id).await.unwrap();
    assert_eq!(copied_items.len(), 1);
    assert_eq!(copied_items[0].description, "Retainer");

    let advanced = invoices
        .iter()
        .find(|invoice| invoice.invoice_id == source.invoice_id)
        .unwrap();
    // Advanced from the previous run date, strictly past it.
    assert_eq!(advanced.next_run_date, Some(datetime(2025, 8, 1, 0, 0, 0)));

    assert!(gather_metrics().contains("recurring_documents_generated_total"));
}

#[tokio::test]
async fn tick_is_a_noop_once_nothing_is_due() {
    let engine = TestEngine::spawn();

    let request = recurring_invoice_request(engine.client_id(), 500, date(2025, 6, 1), "monthly");
    engine
        .documents
        .create_invoice(engine.owner_id(), request)
        .await
        .unwrap();

    engine.scheduler.tick().await;
    assert_eq!(engine.store.invoices().await.len(), 2);

    // The schedule now points at 2025-08-01; later ticks before that date
    // generate nothing.
    engine.scheduler.tick().await;
    engine.clock.set(datetime(2025, 7, 20, 12, 0, 0));
    engine.scheduler.tick().await;
    assert_eq!(engine.store.invoices().await.len(), 2);
}

#[tokio::test]
async fn tick_generates_due_expenses_dated_at_processing_time() {
    let engine = TestEngine::spawn();

    let mut request = expense_request("Bookkeeping", 80, "Personnel");
    request.spent_on = Some(date(2025, 6, 1));
    request.is_recurring = true;
    request.frequency = Some("monthly".to_string());
    let source = engine
        .documents
        .create_expense(engine.owner_id(), request)
        .await
        .unwrap();

    engine.scheduler.tick().await;

    let expenses = engine.store.expenses().await;
    assert_eq!(expenses.len(), 2);

    let copy = expenses
        .iter()
        .find(|expense| expense.expense_id != source.expense_id)
        .expect("generated copy should exist");
    assert!(!copy.is_recurring);
    assert_eq!(copy.next_run_date, None);
    assert_eq!(copy.description, source.description);
    assert_eq!(copy.amount, source.amount);
    assert_eq!(copy.category, source.category);
    assert_eq!(copy.spent_on, date(2025, 7, 15));

    let advanced = expenses
        .iter()
        .find(|expense| expense.expense_id == source.expense_id)
        .unwrap();
    assert_eq!(advanced.next_run_date, Some(datetime(2025, 8, 1, 0, 0, 0)));
}

#[tokio::test]
async fn backlog_larger_than_one_page_is_processed_in_a_single_tick() {
    let engine = TestEngine::with_batch_size(2);

    for _ in 0..5 {
        let request =
            recurring_invoice_request(engine.client_id(), 100, date(2025, 6, 1), "monthly");
        engine
            .documents
            .create_invoice(engine.owner_id(), request)
            .await
            .unwrap();
    }

    engine.scheduler.tick().await;

    let invoices = engine.store.invoices().await;
    let copies = invoices
        .iter()
        .filter(|invoice| !invoice.is_recurring)
        .count();
    assert_eq!(copies, 5);
}

/// Store decorator that fails generation for one poisoned source record.
struct FlakyStore {
    inner: Arc<MemoryStore>,
    poisoned: Uuid,
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn due_invoices(
        &self,
        now: DateTime<Utc>,
        page: DuePage,
    ) -> Result<Vec<Invoice>, AppError> {
        self.inner.due_invoices(now, page).await
    }

    async fn due_expenses(
        &self,
        now: DateTime<Utc>,
        page: DuePage,
    ) -> Result<Vec<Expense>, AppError> {
        self.inner.due_expenses(now, page).await
    }

    async fn insert_invoice(&self, input: &NewInvoice) -> Result<Invoice, AppError> {
        self.inner.insert_invoice(input).await
    }

    async fn insert_expense(&self, input: &NewExpense) -> Result<Expense, AppError> {
        self.inner.insert_expense(input).await
    }

    async fn line_items(&self, invoice_id: Uuid) -> Result<Vec<LineItem>, AppError> {
        self.inner.line_items(invoice_id).await
    }

    async fn generate_invoice(
        &self,
        source_id: Uuid,
        copy: &NewInvoice,
        next_run: DateTime<Utc>,
    ) -> Result<Invoice, AppError> {
        if source_id == self.poisoned {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "injected storage failure"
            )));
        }
        self.inner.generate_invoice(source_id, copy, next_run).await
    }

    async fn generate_expense(
        &self,
        source_id: Uuid,
        copy: &NewExpense,
        next_run: DateTime<Utc>,
    ) -> Result<Expense, AppError> {
        self.inner.generate_expense(source_id, copy, next_run).await
    }

    async fn product(
        &self,
        owner_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<Product>, AppError> {
        self.inner.product(owner_id, product_id).await
    }

    async fn decrement_stock(&self, product_id: Uuid) -> Result<Option<i32>, AppError> {
        self.inner.decrement_stock(product_id).await
    }

    async fn restore_stock(&self, product_id: Uuid, units: i32) -> Result<(), AppError> {
        self.inner.restore_stock(product_id, units).await
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.inner.health_check().await
    }
}

#[tokio::test]
async fn one_failing_record_does_not_block_the_rest_of_the_batch() {
    let engine = TestEngine::spawn();

    let poisoned = engine
        .documents
        .create_invoice(
            engine.owner_id(),
            recurring_invoice_request(engine.client_id(), 100, date(2025, 6, 1), "monthly"),
        )
        .await
        .unwrap();
    let healthy = engine
        .documents
        .create_invoice(
            engine.owner_id(),
            recurring_invoice_request(engine.client_id(), 200, date(2025, 6, 1), "monthly"),
        )
        .await
        .unwrap();

    let flaky = Arc::new(FlakyStore {
        inner: engine.store.clone(),
        poisoned: poisoned.invoice_id,
    });
    let scheduler = RecurrenceScheduler::new(flaky, engine.clock.clone(), 50, 30);

    scheduler.tick().await;

    let invoices = engine.store.invoices().await;
    // Two sources plus the copy of the healthy one.
    assert_eq!(invoices.len(), 3);

    let untouched = invoices
        .iter()
        .find(|invoice| invoice.invoice_id == poisoned.invoice_id)
        .unwrap();
    assert_eq!(untouched.next_run_date, poisoned.next_run_date);

    let advanced = invoices
        .iter()
        .find(|invoice| invoice.invoice_id == healthy.invoice_id)
        .unwrap();
    assert_eq!(advanced.next_run_date, Some(datetime(2025, 8, 1, 0, 0, 0)));
}
