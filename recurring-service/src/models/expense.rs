//! Expense model for recurring-service.

use super::Frequency;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Expense category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "expense_category", rename_all = "lowercase")]
pub enum ExpenseCategory {
    Office,
    Software,
    Marketing,
    Personnel,
    Utilities,
    #[default]
    Other,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Office => "office",
            ExpenseCategory::Software => "software",
            ExpenseCategory::Marketing => "marketing",
            ExpenseCategory::Personnel => "personnel",
            ExpenseCategory::Utilities => "utilities",
            ExpenseCategory::Other => "other",
        }
    }

    /// Case-insensitive; anything outside the closed set lands in `Other`.
    pub fn from_string(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "office" => ExpenseCategory::Office,
            "software" => ExpenseCategory::Software,
            "marketing" => ExpenseCategory::Marketing,
            "personnel" => ExpenseCategory::Personnel,
            "utilities" => ExpenseCategory::Utilities,
            _ => ExpenseCategory::Other,
        }
    }
}

/// Expense record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Expense {
    pub expense_id: Uuid,
    pub owner_id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub category: ExpenseCategory,
    pub spent_on: NaiveDate,
    pub is_recurring: bool,
    pub frequency: Frequency,
    pub next_run_date: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating an expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub owner_id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub category: ExpenseCategory,
    pub spent_on: NaiveDate,
    pub is_recurring: bool,
    pub frequency: Frequency,
    pub next_run_date: Option<DateTime<Utc>>,
}
