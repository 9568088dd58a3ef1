use prometheus::{Encoder, TextEncoder};
use tracing::error;
use super::ApiError;

pub async fn metrics_handler() -> Result<String, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).map_err(|e| {
        error!(error = %e, "failed to encode metrics");
        ApiError::internal()
    })?;
    String::from_utf8(buffer).map_err(|_| ApiError::internal())
}
