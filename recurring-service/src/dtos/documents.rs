//! Request payloads accepted by the document-creation entry points.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    #[validate(required(message = "Please add a client"))]
    pub client_id: Option<Uuid>,

    #[validate(required(message = "Please add an amount"))]
    pub amount: Option<Decimal>,

    #[validate(required(message = "Please add a due date"))]
    pub due_date: Option<NaiveDate>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub items: Vec<LineItemRequest>,

    #[serde(default)]
    pub is_recurring: bool,

    #[serde(default)]
    pub frequency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineItemRequest {
    #[serde(default)]
    pub description: String,

    pub price: Decimal,

    #[serde(default)]
    pub product_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateExpenseRequest {
    #[validate(required(message = "Please add a description"))]
    pub description: Option<String>,

    #[validate(required(message = "Please add an amount"))]
    pub amount: Option<Decimal>,

    #[validate(required(message = "Please add a category"))]
    pub category: Option<String>,

    /// Defaults to the current processing date.
    #[serde(default)]
    pub spent_on: Option<NaiveDate>,

    #[serde(default)]
    pub is_recurring: bool,

    #[serde(default)]
    pub frequency: Option<String>,
}
