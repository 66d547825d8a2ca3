//! Storage abstraction for the engine's persisted records.
//!
//! Every collaborator of the engine takes an `Arc<dyn DocumentStore>`; the
//! PostgreSQL implementation backs production and the in-memory one backs
//! tests and local runs.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::models::{Expense, Invoice, LineItem, NewExpense, NewInvoice, Product};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ops_core::error::AppError;
use uuid::Uuid;

/// Cursor-paged batch request over due recurring records, so one tick never
/// loads the whole backlog at once.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuePage {
    pub limit: i64,
    pub cursor: Option<Uuid>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Recurring invoices whose next run date has been reached, ordered by
    /// id for stable pagination.
    async fn due_invoices(
        &self,
        now: DateTime<Utc>,
        page: DuePage,
    ) -> Result<Vec<Invoice>, AppError>;

    /// Recurring expenses whose next run date has been reached.
    async fn due_expenses(
        &self,
        now: DateTime<Utc>,
        page: DuePage,
    ) -> Result<Vec<Expense>, AppError>;

    /// Persist an invoice and its line items as one unit.
    async fn insert_invoice(&self, input: &NewInvoice) -> Result<Invoice, AppError>;

    /// Persist an expense.
    async fn insert_expense(&self, input: &NewExpense) -> Result<Expense, AppError>;

    /// Line items of an invoice in display order.
    async fn line_items(&self, invoice_id: Uuid) -> Result<Vec<LineItem>, AppError>;

    /// Persist a generated copy and advance the source's schedule in a
    /// single transaction.
    async fn generate_invoice(
        &self,
        source_id: Uuid,
        copy: &NewInvoice,
        next_run: DateTime<Utc>,
    ) -> Result<Invoice, AppError>;

    /// Expense counterpart of [`DocumentStore::generate_invoice`].
    async fn generate_expense(
        &self,
        source_id: Uuid,
        copy: &NewExpense,
        next_run: DateTime<Utc>,
    ) -> Result<Expense, AppError>;

    /// Product scoped to its owner.
    async fn product(&self, owner_id: Uuid, product_id: Uuid)
        -> Result<Option<Product>, AppError>;

    /// Take one unit of stock if any is left. Returns the remaining
    /// quantity, or `None` when the product was already exhausted (or gone).
    /// The condition is evaluated at the storage layer, so concurrent
    /// callers cannot both win the last unit.
    async fn decrement_stock(&self, product_id: Uuid) -> Result<Option<i32>, AppError>;

    /// Return previously taken units.
    async fn restore_stock(&self, product_id: Uuid, units: i32) -> Result<(), AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}
