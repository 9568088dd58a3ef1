use chrono::{DateTime, Duration, Utc};
use tracing::trace;
use crate::error::CounterError;
use crate::record_log::RecordLog;

#[derive(Debug, Clone, Copy)]
pub struct WindowCounter {
    window: Duration,
}

impl WindowCounter {
    pub fn new(window_secs: u64) -> Self {
        // clamp absurd windows instead of overflowing chrono
        let secs = i64::try_from(window_secs).unwrap_or(i64::MAX / 1_000_000);
        let window = Duration::try_seconds(secs).unwrap_or(Duration::MAX);
        Self { window }
    }

    // Oldest instant still inside the window ending at `now` (inclusive).
    pub fn threshold(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    // Appends `now`, then walks back from the tail counting entries at or
    // after `now - window`. Entries are in non-decreasing order, so the first
    // older one ends the scan. A clock that goes backwards undercounts.
    // Caller holds the lock; a failure after the append keeps the entry.
    pub fn count(&self, log: &mut RecordLog, now: DateTime<Utc>) -> Result<usize, CounterError> {
        let width = log.append(now)? as u64;
        let size = log.len()?;
        let stray = size % width;
        if stray != 0 {
            // fragment sits just before the entry we appended
            return Err(CounterError::Decode {
                offset: size - width - stray,
                reason: format!("{} stray bytes, log is not a whole number of entries", stray),
            });
        }

        let threshold = self.threshold(now);
        let mut counter = 0;
        let mut offset = width;

        loop {
            let pos = size - offset;
            let stored = log.read_entry_at(pos)?;

            if stored < threshold {
                break;
            }

            counter += 1;
            if pos == 0 {
                break;
            }
            offset += width;
        }

        trace!(counter, size, "window scan finished");
        Ok(counter)
    }
}
