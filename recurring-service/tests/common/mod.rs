//! Test helper module for recurring-service integration tests.
//!
//! Builds the engine over the in-memory store so the tests need no running
//! database.

#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use recurring_service::dtos::{CreateExpenseRequest, CreateInvoiceRequest, LineItemRequest};
use recurring_service::models::{NewProduct, Product};
use recurring_service::services::clock::FixedClock;
use recurring_service::services::store::{DocumentStore, MemoryStore};
use recurring_service::services::DocumentService;
use recurring_service::workers::RecurrenceScheduler;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

// Test constants for owner context
pub const TEST_OWNER_ID: &str = "11111111-1111-1111-1111-111111111111";
pub const TEST_CLIENT_ID: &str = "22222222-2222-2222-2222-222222222222";

/// Engine wrapper for integration tests.
pub struct TestEngine {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<FixedClock>,
    pub documents: DocumentService,
    pub scheduler: RecurrenceScheduler,
}

impl TestEngine {
    /// Engine over a fresh in-memory store, with the clock parked at
    /// 2025-07-15 12:00 UTC.
    pub fn spawn() -> Self {
        Self::with_batch_size(50)
    }

    pub fn with_batch_size(batch_size: i64) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::new(datetime(2025, 7, 15, 12, 0, 0)));
        let documents = DocumentService::new(store.clone(), clock.clone());
        let scheduler = RecurrenceScheduler::new(store.clone(), clock.clone(), batch_size, 30);
        TestEngine {
            store,
            clock,
            documents,
            scheduler,
        }
    }

    pub fn owner_id(&self) -> Uuid {
        Uuid::parse_str(TEST_OWNER_ID).unwrap()
    }

    pub fn client_id(&self) -> Uuid {
        Uuid::parse_str(TEST_CLIENT_ID).unwrap()
    }

    pub async fn seed_product(&self, name: &str, stock: i32) -> Product {
        self.store
            .add_product(NewProduct {
                owner_id: self.owner_id(),
                name: name.to_string(),
                description: None,
                sku: None,
                price: money(25),
                stock_quantity: stock,
                low_stock_threshold: 2,
                is_active: true,
            })
            .await
    }

    pub async fn product_stock(&self, product_id: Uuid) -> i32 {
        self.store
            .product(self.owner_id(), product_id)
            .await
            .expect("product lookup should not fail")
            .expect("product should exist")
            .stock_quantity
    }
}

pub fn datetime(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

pub fn date(y: i32, mo: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, mo, d).unwrap()
}

pub fn money(units: i64) -> Decimal {
    Decimal::new(units * 100, 2)
}

/// Minimal valid invoice-creation request.
pub fn invoice_request(client_id: Uuid, amount_units: i64, due: NaiveDate) -> CreateInvoiceRequest {
    CreateInvoiceRequest {
        client_id: Some(client_id),
        amount: Some(money(amount_units)),
        due_date: Some(due),
        ..Default::default()
    }
}

/// Recurring invoice-creation request.
pub fn recurring_invoice_request(
    client_id: Uuid,
    amount_units: i64,
    due: NaiveDate,
    frequency: &str,
) -> CreateInvoiceRequest {
    let mut request = invoice_request(client_id, amount_units, due);
    request.is_recurring = true;
    request.frequency = Some(frequency.to_string());
    request
}

/// Line item referencing a product (one unit).
pub fn product_line(product_id: Uuid) -> LineItemRequest {
    LineItemRequest {
        description: "1 unit".to_string(),
        price: money(25),
        product_id: Some(product_id),
    }
}

/// Line item without a product reference.
pub fn service_line(description: &str, price_units: i64) -> LineItemRequest {
    LineItemRequest {
        description: description.to_string(),
        price: money(price_units),
        product_id: None,
    }
}

/// Minimal valid expense-creation request.
pub fn expense_request(
    description: &str,
    amount_units: i64,
    category: &str,
) -> CreateExpenseRequest {
    CreateExpenseRequest {
        description: Some(description.to_string()),
        amount: Some(money(amount_units)),
        category: Some(category.to_string()),
        ..Default::default()
    }
}
