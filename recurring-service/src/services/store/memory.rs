//! In-memory implementation of the document store, used by tests and local
//! runs without a database.

use super::{DocumentStore, DuePage};
use crate::models::{
    Expense, Invoice, LineItem, NewExpense, NewInvoice, NewProduct, Product,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ops_core::error::AppError;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct State {
    invoices: HashMap<Uuid, Invoice>,
    line_items: HashMap<Uuid, Vec<LineItem>>,
    expenses: HashMap<Uuid, Expense>,
    products: HashMap<Uuid, Product>,
}

/// Mutex-guarded maps with the same conditional-update semantics as the SQL
/// store: a decrement only happens while the lock shows stock left, and
/// copy-plus-advance mutates under one lock acquisition.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a product into the catalog.
    pub async fn add_product(&self, input: NewProduct) -> Product {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let product = Product {
            product_id: Uuid::new_v4(),
            owner_id: input.owner_id,
            name: input.name,
            description: input.description,
            sku: input.sku,
            price: input.price,
            stock_quantity: input.stock_quantity,
            low_stock_threshold: input.low_stock_threshold,
            is_active: input.is_active,
            created_utc: now,
            updated_utc: now,
        };
        state.products.insert(product.product_id, product.clone());
        product
    }

    /// Snapshot of every stored invoice in creation order.
    pub async fn invoices(&self) -> Vec<Invoice> {
        let state = self.state.lock().await;
        let mut all: Vec<Invoice> = state.invoices.values().cloned().collect();
        all.sort_by_key(|invoice| invoice.created_utc);
        all
    }

    /// Snapshot of every stored expense in creation order.
    pub async fn expenses(&self) -> Vec<Expense> {
        let state = self.state.lock().await;
        let mut all: Vec<Expense> = state.expenses.values().cloned().collect();
        all.sort_by_key(|expense| expense.created_utc);
        all
    }
}

fn insert_invoice_locked(state: &mut State, input: &NewInvoice, now: DateTime<Utc>) -> Invoice {
    let invoice = Invoice {
        invoice_id: Uuid::new_v4(),
        owner_id: input.owner_id,
        client_id: input.client_id,
        amount: input.amount,
        due_date: input.due_date,
        status: input.status,
        is_recurring: input.is_recurring,
        frequency: input.frequency,
        next_run_date: input.next_run_date,
        created_utc: now,
        updated_utc: now,
    };
    let items = input
        .items
        .iter()
        .enumerate()
        .map(|(sort_order, item)| LineItem {
            line_item_id: Uuid::new_v4(),
            invoice_id: invoice.invoice_id,
            description: item.description.clone(),
            price: item.price,
            product_id: item.product_id,
            sort_order: sort_order as i32,
        })
        .collect();
    state.line_items.insert(invoice.invoice_id, items);
    state.invoices.insert(invoice.invoice_id, invoice.clone());
    invoice
}

fn insert_expense_locked(state: &mut State, input: &NewExpense, now: DateTime<Utc>) -> Expense {
    let expense = Expense {
        expense_id: Uuid::new_v4(),
        owner_id: input.owner_id,
        description: input.description.clone(),
        amount: input.amount,
        category: input.category,
        spent_on: input.spent_on,
        is_recurring: input.is_recurring,
        frequency: input.frequency,
        next_run_date: input.next_run_date,
        created_utc: now,
        updated_utc: now,
    };
    state.expenses.insert(expense.expense_id, expense.clone());
    expense
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn due_invoices(
        &self,
        now: DateTime<Utc>,
        page: DuePage,
    ) -> Result<Vec<Invoice>, AppError> {
        let state = self.state.lock().await;
        let mut due: Vec<Invoice> = state
            .invoices
            .values()
            .filter(|invoice| {
                invoice.is_recurring
                    && invoice.next_run_date.is_some_and(|next| next <= now)
                    && page.cursor.is_none_or(|cursor| invoice.invoice_id > cursor)
            })
            .cloned()
            .collect();
        due.sort_by_key(|invoice| invoice.invoice_id);
        due.truncate(page.limit.max(0) as usize);
        Ok(due)
    }

    async fn due_expenses(
        &self,
        now: DateTime<Utc>,
        page: DuePage,
    ) -> Result<Vec<Expense>, AppError> {
        let state = self.state.lock().await;
        let mut due: Vec<Expense> = state
            .expenses
            .values()
            .filter(|expense| {
                expense.is_recurring
                    && expense.next_run_date.is_some_and(|next| next <= now)
                    && page.cursor.is_none_or(|cursor| expense.expense_id > cursor)
            })
            .cloned()
            .collect();
        due.sort_by_key(|expense| expense.expense_id);
        due.truncate(page.limit.max(0) as usize);
        Ok(due)
    }

    async fn insert_invoice(&self, input: &NewInvoice) -> Result<Invoice, AppError> {
        let mut state = self.state.lock().await;
        Ok(insert_invoice_locked(&mut state, input, Utc::now()))
    }

    async fn insert_expense(&self, input: &NewExpense) -> Result<Expense, AppError> {
        let mut state = self.state.lock().await;
        Ok(insert_expense_locked(&mut state, input, Utc::now()))
    }

    async fn line_items(&self, invoice_id: Uuid) -> Result<Vec<LineItem>, AppError> {
        let state = self.state.lock().await;
        Ok(state.line_items.get(&invoice_id).cloned().unwrap_or_default())
    }

    async fn generate_invoice(
        &self,
        source_id: Uuid,
        copy: &NewInvoice,
        next_run: DateTime<Utc>,
    ) -> Result<Invoice, AppError> {
        let mut state = self.state.lock().await;
        if !state
            .invoices
            .get(&source_id)
            .is_some_and(|source| source.is_recurring)
        {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Recurring invoice {} not found",
                source_id
            )));
        }

        let now = Utc::now();
        let invoice = insert_invoice_locked(&mut state, copy, now);
        if let Some(source) = state.invoices.get_mut(&source_id) {
            source.next_run_date = Some(next_run);
            source.updated_utc = now;
        }
        Ok(invoice)
    }

    async fn generate_expense(
        &self,
        source_id: Uuid,
        copy: &NewExpense,
        next_run: DateTime<Utc>,
    ) -> Result<Expense, AppError> {
        let mut state = self.state.lock().await;
        if !state
            .expenses
            .get(&source_id)
            .is_some_and(|source| source.is_recurring)
        {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Recurring expense {} not found",
                source_id
            )));
        }

        let now = Utc::now();
        let expense = insert_expense_locked(&mut state, copy, now);
        if let Some(source) = state.expenses.get_mut(&source_id) {
            source.next_run_date = Some(next_run);
            source.updated_utc = now;
        }
        Ok(expense)
    }

    async fn product(
        &self,
        owner_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<Product>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .products
            .get(&product_id)
            .filter(|product| product.owner_id == owner_id)
            .cloned())
    }

    async fn decrement_stock(&self, product_id: Uuid) -> Result<Option<i32>, AppError> {
        let mut state = self.state.lock().await;
        match state.products.get_mut(&product_id) {
            Some(product) if product.stock_quantity > 0 => {
                product.stock_quantity -= 1;
                product.updated_utc = Utc::now();
                Ok(Some(product.stock_quantity))
            }
            _ => Ok(None),
        }
    }

    async fn restore_stock(&self, product_id: Uuid, units: i32) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if let Some(product) = state.products.get_mut(&product_id) {
            product.stock_quantity += units;
            product.updated_utc = Utc::now();
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
