//! PostgreSQL implementation of the document store.

use super::{DocumentStore, DuePage};
use crate::models::{Expense, Invoice, LineItem, NewExpense, NewInvoice, NewLineItem, Product};
use crate::services::metrics::DB_QUERY_DURATION;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ops_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "recurring-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

async fn insert_invoice_row(
    tx: &mut Transaction<'_, Postgres>,
    input: &NewInvoice,
) -> Result<Invoice, AppError> {
    let invoice_id = Uuid::new_v4();
    sqlx::query_as::<_, Invoice>(
        r#"
        INSERT INTO invoices (invoice_id, owner_id, client_id, amount, due_date, status, is_recurring, frequency, next_run_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING invoice_id, owner_id, client_id, amount, due_date, status, is_recurring, frequency, next_run_date, created_utc, updated_utc
        "#,
    )
    .bind(invoice_id)
    .bind(input.owner_id)
    .bind(input.client_id)
    .bind(input.amount)
    .bind(input.due_date)
    .bind(input.status)
    .bind(input.is_recurring)
    .bind(input.frequency)
    .bind(input.next_run_date)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice: {}", e)))
}

async fn insert_line_item_rows(
    tx: &mut Transaction<'_, Postgres>,
    invoice_id: Uuid,
    items: &[NewLineItem],
) -> Result<(), AppError> {
    for (sort_order, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO invoice_line_items (line_item_id, invoice_id, description, price, product_id, sort_order)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(invoice_id)
        .bind(&item.description)
        .bind(item.price)
        .bind(item.product_id)
        .bind(sort_order as i32)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to create line item: {}", e))
        })?;
    }
    Ok(())
}

async fn insert_expense_row(
    tx: &mut Transaction<'_, Postgres>,
    input: &NewExpense,
) -> Result<Expense, AppError> {
    let expense_id = Uuid::new_v4();
    sqlx::query_as::<_, Expense>(
        r#"
        INSERT INTO expenses (expense_id, owner_id, description, amount, category, spent_on, is_recurring, frequency, next_run_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING expense_id, owner_id, description, amount, category, spent_on, is_recurring, frequency, next_run_date, created_utc, updated_utc
        "#,
    )
    .bind(expense_id)
    .bind(input.owner_id)
    .bind(&input.description)
    .bind(input.amount)
    .bind(input.category)
    .bind(input.spent_on)
    .bind(input.is_recurring)
    .bind(input.frequency)
    .bind(input.next_run_date)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create expense: {}", e)))
}

#[async_trait]
impl DocumentStore for PgStore {
    #[instrument(skip(self))]
    async fn due_invoices(
        &self,
        now: DateTime<Utc>,
        page: DuePage,
    ) -> Result<Vec<Invoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["due_invoices"])
            .start_timer();

        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT invoice_id, owner_id, client_id, amount, due_date, status, is_recurring, frequency, next_run_date, created_utc, updated_utc
            FROM invoices
            WHERE is_recurring = TRUE
              AND next_run_date <= $1
              AND ($2::uuid IS NULL OR invoice_id > $2)
            ORDER BY invoice_id
            LIMIT $3
            "#,
        )
        .bind(now)
        .bind(page.cursor)
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to query due invoices: {}", e))
        })?;

        timer.observe_duration();

        Ok(invoices)
    }

    #[instrument(skip(self))]
    async fn due_expenses(
        &self,
        now: DateTime<Utc>,
        page: DuePage,
    ) -> Result<Vec<Expense>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["due_expenses"])
            .start_timer();

        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT expense_id, owner_id, description, amount, category, spent_on, is_recurring, frequency, next_run_date, created_utc, updated_utc
            FROM expenses
            WHERE is_recurring = TRUE
              AND next_run_date <= $1
              AND ($2::uuid IS NULL OR expense_id > $2)
            ORDER BY expense_id
            LIMIT $3
            "#,
        )
        .bind(now)
        .bind(page.cursor)
        .bind(page.limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to query due expenses: {}", e))
        })?;

        timer.observe_duration();

        Ok(expenses)
    }

    #[instrument(skip(self, input), fields(owner_id = %input.owner_id))]
    async fn insert_invoice(&self, input: &NewInvoice) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let invoice = insert_invoice_row(&mut tx, input).await?;
        insert_line_item_rows(&mut tx, invoice.invoice_id, &input.items).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit invoice: {}", e))
        })?;

        timer.observe_duration();

        info!(invoice_id = %invoice.invoice_id, "Invoice created");

        Ok(invoice)
    }

    #[instrument(skip(self, input), fields(owner_id = %input.owner_id))]
    async fn insert_expense(&self, input: &NewExpense) -> Result<Expense, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_expense"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let expense = insert_expense_row(&mut tx, input).await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit expense: {}", e))
        })?;

        timer.observe_duration();

        info!(expense_id = %expense.expense_id, "Expense created");

        Ok(expense)
    }

    #[instrument(skip(self))]
    async fn line_items(&self, invoice_id: Uuid) -> Result<Vec<LineItem>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["line_items"])
            .start_timer();

        let items = sqlx::query_as::<_, LineItem>(
            r#"
            SELECT line_item_id, invoice_id, description, price, product_id, sort_order
            FROM invoice_line_items
            WHERE invoice_id = $1
            ORDER BY sort_order
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get line items: {}", e))
        })?;

        timer.observe_duration();

        Ok(items)
    }

    #[instrument(skip(self, copy))]
    async fn generate_invoice(
        &self,
        source_id: Uuid,
        copy: &NewInvoice,
        next_run: DateTime<Utc>,
    ) -> Result<Invoice, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["generate_invoice"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let invoice = insert_invoice_row(&mut tx, copy).await?;
        insert_line_item_rows(&mut tx, invoice.invoice_id, &copy.items).await?;

        let updated = sqlx::query(
            r#"
            UPDATE invoices
            SET next_run_date = $2, updated_utc = NOW()
            WHERE invoice_id = $1 AND is_recurring = TRUE
            "#,
        )
        .bind(source_id)
        .bind(next_run)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to advance schedule: {}", e))
        })?;

        if updated.rows_affected() == 0 {
            // Dropping the transaction rolls the copy back.
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Recurring invoice {} not found",
                source_id
            )));
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit generation: {}", e))
        })?;

        timer.observe_duration();

        Ok(invoice)
    }

    #[instrument(skip(self, copy))]
    async fn generate_expense(
        &self,
        source_id: Uuid,
        copy: &NewExpense,
        next_run: DateTime<Utc>,
    ) -> Result<Expense, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["generate_expense"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let expense = insert_expense_row(&mut tx, copy).await?;

        let updated = sqlx::query(
            r#"
            UPDATE expenses
            SET next_run_date = $2, updated_utc = NOW()
            WHERE expense_id = $1 AND is_recurring = TRUE
            "#,
        )
        .bind(source_id)
        .bind(next_run)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to advance schedule: {}", e))
        })?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "Recurring expense {} not found",
                source_id
            )));
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit generation: {}", e))
        })?;

        timer.observe_duration();

        Ok(expense)
    }

    #[instrument(skip(self))]
    async fn product(
        &self,
        owner_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<Product>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["product"])
            .start_timer();

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT product_id, owner_id, name, description, sku, price, stock_quantity, low_stock_threshold, is_active, created_utc, updated_utc
            FROM products
            WHERE owner_id = $1 AND product_id = $2
            "#,
        )
        .bind(owner_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get product: {}", e)))?;

        timer.observe_duration();

        Ok(product)
    }

    #[instrument(skip(self))]
    async fn decrement_stock(&self, product_id: Uuid) -> Result<Option<i32>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["decrement_stock"])
            .start_timer();

        // Condition and decrement in one statement: concurrent requests
        // cannot both take the last unit.
        let remaining = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity - 1, updated_utc = NOW()
            WHERE product_id = $1 AND stock_quantity > 0
            RETURNING stock_quantity
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to decrement stock: {}", e))
        })?;

        timer.observe_duration();

        Ok(remaining)
    }

    #[instrument(skip(self))]
    async fn restore_stock(&self, product_id: Uuid, units: i32) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["restore_stock"])
            .start_timer();

        sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity + $2, updated_utc = NOW()
            WHERE product_id = $1
            "#,
        )
        .bind(product_id)
        .bind(units)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to restore stock: {}", e)))?;

        timer.observe_duration();

        Ok(())
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}
