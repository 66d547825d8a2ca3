//! Prometheus metrics for recurring-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_counter, CounterVec, HistogramVec,
    IntCounter, TextEncoder,
};

/// Generated document counter by kind.
pub static DOCUMENTS_GENERATED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "recurring_documents_generated_total",
        "Total number of documents generated from recurring series",
        &["kind"] // invoice, expense
    )
    .expect("Failed to register documents_generated_total")
});

/// Per-record generation failures by kind.
pub static GENERATION_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "recurring_generation_failures_total",
        "Total number of recurring documents that failed to generate",
        &["kind"]
    )
    .expect("Failed to register generation_failures_total")
});

/// Scheduler tick counter.
pub static SCHEDULER_TICKS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "recurring_scheduler_ticks_total",
        "Total number of scheduler ticks"
    )
    .expect("Failed to register scheduler_ticks_total")
});

/// Stock decrement outcomes.
pub static STOCK_DECREMENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "recurring_stock_decrements_total",
        "Stock decrement attempts by outcome",
        &["outcome"] // committed, rejected, released
    )
    .expect("Failed to register stock_decrements_total")
});

/// Decrements that left a product at or below its low-stock threshold.
pub static LOW_STOCK_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "recurring_low_stock_total",
        "Decrements that left a product at or below its low-stock threshold"
    )
    .expect("Failed to register low_stock_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "recurring_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "recurring_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&DOCUMENTS_GENERATED_TOTAL);
    Lazy::force(&GENERATION_FAILURES_TOTAL);
    Lazy::force(&SCHEDULER_TICKS_TOTAL);
    Lazy::force(&STOCK_DECREMENTS_TOTAL);
    Lazy::force(&LOW_STOCK_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Render the current metrics in the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    encoder
        .encode_to_string(&prometheus::gather())
        .unwrap_or_default()
}
