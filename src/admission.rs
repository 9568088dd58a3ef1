use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;
use crate::error::CounterError;
use crate::metrics::{ADMISSION_IN_FLIGHT, ADMISSION_WAIT};

// Semaphore-bounded admission with a fixed post-admission delay
#[derive(Debug, Clone)]
pub struct AdmissionController {
    semaphore: Arc<Semaphore>,
    capacity: usize,
    delay: Duration,
    max_wait: Option<Duration>,
}

// Permission to run one operation. Dropping it frees the slot.
#[derive(Debug)]
pub struct AdmissionSlot {
    _permit: OwnedSemaphorePermit,
}

impl Drop for AdmissionSlot {
    fn drop(&mut self) {
        ADMISSION_IN_FLIGHT.dec();
    }
}

impl AdmissionController {
    pub fn new(capacity: usize, delay: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            delay,
            max_wait: None,
        }
    }

    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }

    // Waits for a free slot (forever unless a max wait is set), then sleeps
    // for the configured delay. Fails only after close() or on max wait.
    pub async fn admit(&self) -> Result<AdmissionSlot, CounterError> {
        let started = Instant::now();
        let acquire = self.semaphore.clone().acquire_owned();

        let permit = match self.max_wait {
            None => acquire.await,
            Some(limit) => tokio::time::timeout(limit, acquire)
                .await
                .map_err(|_| CounterError::Overloaded {
                    waited_ms: started.elapsed().as_millis(),
                })?,
        }
        .map_err(|_| CounterError::Closed)?;

        ADMISSION_IN_FLIGHT.inc();
        let slot = AdmissionSlot { _permit: permit };

        let waited = started.elapsed();
        ADMISSION_WAIT.observe(waited.as_secs_f64());
        debug!(waited_ms = waited.as_millis() as u64, in_flight = self.in_flight(), "admitted");

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        Ok(slot)
    }

    // Wakes every waiter with `Closed`. Slots already held stay valid.
    pub fn close(&self) {
        self.semaphore.close();
    }
}
