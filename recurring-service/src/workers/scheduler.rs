//! Periodic driver that finds due recurring documents and regenerates them.

use crate::services::clock::Clock;
use crate::services::metrics::{ERRORS_TOTAL, GENERATION_FAILURES_TOTAL, SCHEDULER_TICKS_TOTAL};
use crate::services::store::{DocumentStore, DuePage};
use crate::workers::generator::DocumentGenerator;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use uuid::Uuid;

pub struct RecurrenceScheduler {
    store: Arc<dyn DocumentStore>,
    generator: DocumentGenerator,
    clock: Arc<dyn Clock>,
    batch_size: i64,
}

impl RecurrenceScheduler {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        batch_size: i64,
        due_term_days: i64,
    ) -> Self {
        let generator = DocumentGenerator::new(store.clone(), clock.clone(), due_term_days);
        Self {
            store,
            generator,
            clock,
            batch_size,
        }
    }

    /// One full pass over everything currently due. Failures are isolated
    /// per record and the tick itself never fails; the outcome is visible
    /// through store state, logs and metrics.
    pub async fn tick(&self) {
        SCHEDULER_TICKS_TOTAL.inc();
        let started = Instant::now();
        let now = self.clock.now();

        let (invoices_generated, invoices_failed) = self.run_invoices(now).await;
        let (expenses_generated, expenses_failed) = self.run_expenses(now).await;

        info!(
            invoices_generated,
            invoices_failed,
            expenses_generated,
            expenses_failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Recurrence tick complete"
        );
    }

    async fn run_invoices(&self, now: DateTime<Utc>) -> (u64, u64) {
        let mut generated = 0u64;
        let mut failed = 0u64;
        let mut cursor: Option<Uuid> = None;

        loop {
            let page = DuePage {
                limit: self.batch_size,
                cursor,
            };
            let due = match self.store.due_invoices(now, page).await {
                Ok(due) => due,
                Err(e) => {
                    ERRORS_TOTAL.with_label_values(&["store"]).inc();
                    error!(error = %e, "Failed to query due invoices");
                    break;
                }
            };
            let Some(last) = due.last() else { break };
            cursor = Some(last.invoice_id);
            let page_len = due.len() as i64;

            for invoice in due {
                match self.generator.generate_invoice(&invoice).await {
                    Ok(_) => generated += 1,
                    Err(e) => {
                        GENERATION_FAILURES_TOTAL
                            .with_label_values(&["invoice"])
                            .inc();
                        error!(
                            invoice_id = %invoice.invoice_id,
                            error = %e,
                            "Failed to generate recurring invoice"
                        );
                        failed += 1;
                    }
                }
            }

            if page_len < self.batch_size {
                break;
            }
        }

        (generated, failed)
    }

    async fn run_expenses(&self, now: DateTime<Utc>) -> (u64, u64) {
        let mut generated = 0u64;
        let mut failed = 0u64;
        let mut cursor: Option<Uuid> = None;

        loop {
            let page = DuePage {
                limit: self.batch_size,
                cursor,
            };
            let due = match self.store.due_expenses(now, page).await {
                Ok(due) => due,
                Err(e) => {
                    ERRORS_TOTAL.with_label_values(&["store"]).inc();
                    error!(error = %e, "Failed to query due expenses");
                    break;
                }
            };
            let Some(last) = due.last() else { break };
            cursor = Some(last.expense_id);
            let page_len = due.len() as i64;

            for expense in due {
                match self.generator.generate_expense(&expense).await {
                    Ok(_) => generated += 1,
                    Err(e) => {
                        GENERATION_FAILURES_TOTAL
                            .with_label_values(&["expense"])
                            .inc();
                        error!(
                            expense_id = %expense.expense_id,
                            error = %e,
                            "Failed to generate recurring expense"
                        );
                        failed += 1;
                    }
                }
            }

            if page_len < self.batch_size {
                break;
            }
        }

        (generated, failed)
    }
}
