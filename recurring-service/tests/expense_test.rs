//! Expense creation integration tests for recurring-service.

mod common;

use common::{date, datetime, expense_request, TestEngine};
use recurring_service::error::EngineError;
use recurring_service::models::{ExpenseCategory, Frequency};

#[tokio::test]
async fn create_expense_defaults_date_to_today() {
    let engine = TestEngine::spawn();

    let expense = engine
        .documents
        .create_expense(engine.owner_id(), expense_request("Stamps", 12, "Office"))
        .await
        .expect("expense should be created");

    // The injected clock sits at 2025-07-15.
    assert_eq!(expense.spent_on, date(2025, 7, 15));
    assert_eq!(expense.category, ExpenseCategory::Office);
    assert!(!expense.is_recurring);
    assert_eq!(expense.next_run_date, None);
}

#[tokio::test]
async fn create_expense_rejects_missing_required_fields() {
    let engine = TestEngine::spawn();
    let owner_id = engine.owner_id();

    let mut missing_description = expense_request("Stamps", 12, "Office");
    missing_description.description = None;
    let mut missing_amount = expense_request("Stamps", 12, "Office");
    missing_amount.amount = None;
    let mut missing_category = expense_request("Stamps", 12, "Office");
    missing_category.category = None;

    for request in [missing_description, missing_amount, missing_category] {
        let result = engine.documents.create_expense(owner_id, request).await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    assert!(engine.store.expenses().await.is_empty());
}

#[tokio::test]
async fn category_outside_the_closed_set_lands_in_other() {
    let engine = TestEngine::spawn();

    let software = engine
        .documents
        .create_expense(engine.owner_id(), expense_request("IDE", 99, "Software"))
        .await
        .unwrap();
    assert_eq!(software.category, ExpenseCategory::Software);

    let unknown = engine
        .documents
        .create_expense(engine.owner_id(), expense_request("Sundry", 10, "Groceries"))
        .await
        .unwrap();
    assert_eq!(unknown.category, ExpenseCategory::Other);
}

#[tokio::test]
async fn yearly_series_from_january_31_lands_exactly_one_year_later() {
    let engine = TestEngine::spawn();

    let mut request = expense_request("Domain renewal", 30, "Software");
    request.spent_on = Some(date(2024, 1, 31));
    request.is_recurring = true;
    request.frequency = Some("yearly".to_string());

    let expense = engine
        .documents
        .create_expense(engine.owner_id(), request)
        .await
        .unwrap();

    assert_eq!(expense.frequency, Frequency::Yearly);
    assert_eq!(expense.next_run_date, Some(datetime(2025, 1, 31, 0, 0, 0)));
}

#[tokio::test]
async fn monthly_series_from_january_31_clamps_to_february_end() {
    let engine = TestEngine::spawn();

    let mut request = expense_request("Rent", 1200, "Office");
    request.spent_on = Some(date(2024, 1, 31));
    request.is_recurring = true;
    request.frequency = Some("monthly".to_string());

    let expense = engine
        .documents
        .create_expense(engine.owner_id(), request)
        .await
        .unwrap();

    assert_eq!(expense.next_run_date, Some(datetime(2024, 2, 29, 0, 0, 0)));
}
