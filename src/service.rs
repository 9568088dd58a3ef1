use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};
use crate::admission::AdmissionController;
use crate::error::CounterError;
use crate::guard::{ConcurrencyGuard, LockStrategy, build_guard};
use crate::metrics::{REQUEST_FAILURES, REQUEST_LATENCY, REQUEST_TOTAL, WINDOW_COUNT};
use crate::window::WindowCounter;

// Validated settings for one counter service. Immutable once built.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub file_location: PathBuf,
    pub window_secs: u64,
    pub max_concurrent: usize,
    pub request_delay: Duration,
    pub lock_strategy: LockStrategy,
    pub admission_timeout: Option<Duration>,
}

impl ServiceConfig {
    pub fn new(file_location: impl Into<PathBuf>, window_secs: u64) -> Self {
        Self {
            file_location: file_location.into(),
            window_secs,
            max_concurrent: 5,
            request_delay: Duration::ZERO,
            lock_strategy: LockStrategy::InProcess,
            admission_timeout: None,
        }
    }
}

// Admission in front, guarded window count behind.
pub struct CounterService {
    admission: AdmissionController,
    guard: Arc<dyn ConcurrencyGuard>,
}

impl CounterService {
    pub fn new(config: &ServiceConfig) -> Result<Self, CounterError> {
        let counter = WindowCounter::new(config.window_secs);
        let guard = build_guard(config.lock_strategy, &config.file_location, counter)?;
        let admission = AdmissionController::new(config.max_concurrent, config.request_delay)
            .with_max_wait(config.admission_timeout);

        info!(
            file = %config.file_location.display(),
            window_secs = config.window_secs,
            max_concurrent = admission.capacity(),
            delay_ms = config.request_delay.as_millis() as u64,
            strategy = ?config.lock_strategy,
            "counter service ready"
        );

        Ok(Self::with_guard(admission, guard))
    }

    pub fn with_guard(admission: AdmissionController, guard: Arc<dyn ConcurrencyGuard>) -> Self {
        Self { admission, guard }
    }

    pub fn admission(&self) -> &AdmissionController {
        &self.admission
    }

    pub async fn get_count(&self) -> Result<usize, CounterError> {
        self.get_count_at(Utc::now()).await
    }

    // Pending -> admitted -> delayed -> counting. The slot moves into the
    // blocking task so a dropped caller cannot free it while the count runs.
    pub async fn get_count_at(&self, now: DateTime<Utc>) -> Result<usize, CounterError> {
        REQUEST_TOTAL.inc();
        let start_time = Instant::now();

        let result = async {
            let slot = self.admission.admit().await?;
            let guard = Arc::clone(&self.guard);
            tokio::task::spawn_blocking(move || {
                let _slot = slot;
                guard.count(now)
            })
            .await?
        }
        .await;

        REQUEST_LATENCY.observe(start_time.elapsed().as_secs_f64());
        match &result {
            Ok(count) => WINDOW_COUNT.set(*count as f64),
            Err(e) => {
                REQUEST_FAILURES.inc();
                error!(error = %e, "failed to count requests in window");
            }
        }
        result
    }

    // Stops admitting new work and releases the log handle.
    pub fn shutdown(&self) -> Result<(), CounterError> {
        self.admission.close();
        self.guard.shutdown()?;
        info!("counter service stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wall_clock_counts_accumulate() {
        let dir = tempfile::tempdir().unwrap();
        let service = CounterService::new(&ServiceConfig::new(dir.path().join("log"), 60)).unwrap();
        assert_eq!(service.get_count().await.unwrap(), 1);
        assert_eq!(service.get_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn shutdown_rejects_later_calls() {
        let dir = tempfile::tempdir().unwrap();
        let service = CounterService::new(&ServiceConfig::new(dir.path().join("log"), 60)).unwrap();
        service.get_count().await.unwrap();
        service.shutdown().unwrap();
        assert!(matches!(service.get_count().await, Err(CounterError::Closed)));
    }

    #[tokio::test]
    async fn failed_count_releases_slot() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServiceConfig::new(dir.path().join("log"), 60);
        config.max_concurrent = 1;
        let service = CounterService::new(&config).unwrap();

        let before_epoch = DateTime::<Utc>::from_timestamp(-5, 0).unwrap();
        assert!(service.get_count_at(before_epoch).await.is_err());
        assert_eq!(service.admission().in_flight(), 0);
        assert_eq!(service.get_count().await.unwrap(), 1);
    }
}
