use lazy_static::lazy_static;
use prometheus::{
    Counter, Gauge, Histogram, IntGauge, register_counter, register_gauge, register_histogram,
    register_int_gauge,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("window_counter_requests_total", "Total number of count requests").unwrap();
    pub static ref REQUEST_FAILURES: Counter =
        register_counter!("window_counter_failures_total", "Count requests that failed").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "window_counter_request_latency_seconds",
        "End-to-end count latency in seconds, admission and delay included"
    )
    .unwrap();
    pub static ref ADMISSION_WAIT: Histogram = register_histogram!(
        "window_counter_admission_wait_seconds",
        "Time spent waiting for an admission slot"
    )
    .unwrap();
    pub static ref ADMISSION_IN_FLIGHT: IntGauge =
        register_int_gauge!("window_counter_in_flight", "Operations currently holding an admission slot").unwrap();
    pub static ref WINDOW_COUNT: Gauge =
        register_gauge!("window_counter_last_count", "Most recent count returned").unwrap();
}
