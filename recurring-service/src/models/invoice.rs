//! Invoice model for recurring-service.

use super::Frequency;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Invoice status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "invoice_status", rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Unpaid,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::Paid => "paid",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "paid" => InvoiceStatus::Paid,
            _ => InvoiceStatus::Unpaid,
        }
    }
}

/// Invoice document. Line items live in their own table and are fetched
/// separately in display order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub owner_id: Uuid,
    pub client_id: Uuid,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub is_recurring: bool,
    pub frequency: Frequency,
    pub next_run_date: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Line item on an invoice. There is no quantity column: a line that
/// references a product consumes exactly one unit.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LineItem {
    pub line_item_id: Uuid,
    pub invoice_id: Uuid,
    pub description: String,
    pub price: Decimal,
    pub product_id: Option<Uuid>,
    pub sort_order: i32,
}

/// Input for creating an invoice together with its line items.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub owner_id: Uuid,
    pub client_id: Uuid,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
    pub items: Vec<NewLineItem>,
    pub is_recurring: bool,
    pub frequency: Frequency,
    pub next_run_date: Option<DateTime<Utc>>,
}

/// Input for one line item.
#[derive(Debug, Clone)]
pub struct NewLineItem {
    pub description: String,
    pub price: Decimal,
    pub product_id: Option<Uuid>,
}
