//! Prometheus metrics for admissions-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, HistogramVec, TextEncoder,
};

/// Identifier allocations by sequence kind.
pub static ALLOCATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "admissions_allocations_total",
        "Total number of identifier allocations",
        &["kind"]
    )
    .expect("Failed to register allocations_total")
});

/// Fee receipts by payment mode.
pub static RECEIPTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "admissions_receipts_total",
        "Total number of fee receipts by payment mode",
        &["payment_mode"]
    )
    .expect("Failed to register receipts_total")
});

/// Collected fee amount by component.
pub static FEE_AMOUNT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "admissions_fee_amount_total",
        "Total collected fee amount by component",
        &["component"] // admission, course
    )
    .expect("Failed to register fee_amount_total")
});

/// Completed registrations.
pub static REGISTRATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "admissions_registrations_total",
        "Total number of completed registrations",
        &["branch"]
    )
    .expect("Failed to register registrations_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "admissions_errors_total",
        "Total number of errors by type",
        &["error_type"]
    )
    .expect("Failed to register errors_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "admissions_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&ALLOCATIONS_TOTAL);
    Lazy::force(&RECEIPTS_TOTAL);
    Lazy::force(&FEE_AMOUNT_TOTAL);
    Lazy::force(&REGISTRATIONS_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
