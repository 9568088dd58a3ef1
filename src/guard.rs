// One append-and-scan at a time: in-process mutex or cross-process flock.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use fs2::FileExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};
use crate::error::CounterError;
use crate::record_log::RecordLog;
use crate::window::WindowCounter;

pub trait ConcurrencyGuard: Send + Sync {
    fn count(&self, now: DateTime<Utc>) -> Result<usize, CounterError>;

    // Releases any held file handle; later counts fail with `Closed`.
    fn shutdown(&self) -> Result<(), CounterError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LockStrategy {
    #[default]
    InProcess,
    FileLock,
}

pub fn build_guard(
    strategy: LockStrategy,
    path: impl AsRef<Path>,
    counter: WindowCounter,
) -> Result<Arc<dyn ConcurrencyGuard>, CounterError> {
    debug!(?strategy, path = %path.as_ref().display(), "building concurrency guard");
    Ok(match strategy {
        LockStrategy::InProcess => Arc::new(InProcessGuard::open(path, counter)?),
        LockStrategy::FileLock => Arc::new(FileLockGuard::new(path, counter)?),
    })
}

#[derive(Debug)]
pub struct InProcessGuard {
    log: Mutex<Option<RecordLog>>,
    counter: WindowCounter,
}

impl InProcessGuard {
    pub fn open(path: impl AsRef<Path>, counter: WindowCounter) -> Result<Self, CounterError> {
        Ok(Self {
            log: Mutex::new(Some(RecordLog::open(path)?)),
            counter,
        })
    }
}

impl ConcurrencyGuard for InProcessGuard {
    fn count(&self, now: DateTime<Utc>) -> Result<usize, CounterError> {
        // a panic mid-scan never leaves a half-written entry, so poison is harmless
        let mut slot = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        let log = slot.as_mut().ok_or(CounterError::Closed)?;
        self.counter.count(log, now)
    }

    fn shutdown(&self) -> Result<(), CounterError> {
        let taken = self
            .log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match taken {
            Some(log) => {
                debug!(path = %log.path().display(), "closing record log");
                log.sync()
            }
            None => Ok(()),
        }
    }
}

#[derive(Debug)]
pub struct FileLockGuard {
    path: PathBuf,
    counter: WindowCounter,
    closed: AtomicBool,
}

impl FileLockGuard {
    // Opens once up front so a bad path fails at startup, not on first call.
    pub fn new(path: impl AsRef<Path>, counter: WindowCounter) -> Result<Self, CounterError> {
        let path = path.as_ref().to_path_buf();
        RecordLog::open(&path)?;
        Ok(Self {
            path,
            counter,
            closed: AtomicBool::new(false),
        })
    }
}

impl ConcurrencyGuard for FileLockGuard {
    fn count(&self, now: DateTime<Utc>) -> Result<usize, CounterError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CounterError::Closed);
        }

        let log = RecordLog::open(&self.path)?;
        let mut locked = LockedLog::acquire(log)?;
        self.counter.count(&mut locked.log, now)
    }

    fn shutdown(&self) -> Result<(), CounterError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

// Holds the advisory lock for as long as it lives. Unlock runs on drop,
// on every exit path, and closing the file would release it anyway.
struct LockedLog {
    log: RecordLog,
}

impl LockedLog {
    fn acquire(log: RecordLog) -> Result<Self, CounterError> {
        FileExt::lock_exclusive(log.file()).map_err(CounterError::Lock)?;
        Ok(Self { log })
    }
}

impl Drop for LockedLog {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(self.log.file()) {
            warn!(error = %e, path = %self.log.path().display(), "failed to release log lock");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::thread;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn hammer(guard: Arc<dyn ConcurrencyGuard>, threads: usize) -> usize {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let guard = guard.clone();
                thread::spawn(move || guard.count(at(1_000)).unwrap())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        guard.count(at(1_000)).unwrap()
    }

    #[test]
    fn in_process_guard_serializes_threads() {
        let dir = tempfile::tempdir().unwrap();
        let guard = build_guard(LockStrategy::InProcess, dir.path().join("log"), WindowCounter::new(60)).unwrap();
        assert_eq!(hammer(guard, 32), 33);
    }

    #[test]
    fn file_lock_guard_serializes_threads() {
        let dir = tempfile::tempdir().unwrap();
        let guard = build_guard(LockStrategy::FileLock, dir.path().join("log"), WindowCounter::new(60)).unwrap();
        assert_eq!(hammer(guard, 32), 33);
    }

    #[test]
    fn two_file_lock_guards_share_one_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.log");
        let a = FileLockGuard::new(&path, WindowCounter::new(60)).unwrap();
        let b = FileLockGuard::new(&path, WindowCounter::new(60)).unwrap();

        assert_eq!(a.count(at(10)).unwrap(), 1);
        assert_eq!(b.count(at(11)).unwrap(), 2);
        assert_eq!(a.count(at(12)).unwrap(), 3);
    }

    #[test]
    fn counts_fail_after_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        for strategy in [LockStrategy::InProcess, LockStrategy::FileLock] {
            let guard = build_guard(strategy, dir.path().join(format!("{:?}", strategy)), WindowCounter::new(60)).unwrap();
            guard.count(at(1)).unwrap();
            guard.shutdown().unwrap();
            guard.shutdown().unwrap();
            assert!(matches!(guard.count(at(2)), Err(CounterError::Closed)));
        }
    }

    #[test]
    fn unwritable_path_fails_at_build() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir").join("log");
        for strategy in [LockStrategy::InProcess, LockStrategy::FileLock] {
            assert!(matches!(
                build_guard(strategy, &missing, WindowCounter::new(60)),
                Err(CounterError::Io { .. })
            ));
        }
    }
}
