pub mod admission;
pub mod app;
pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod record_log;
pub mod service;
pub mod state;
pub mod window;

pub use admission::{AdmissionController, AdmissionSlot};
pub use app::Application;
pub use config::Args;
pub use error::{AppError, CounterError};
pub use guard::{ConcurrencyGuard, FileLockGuard, InProcessGuard, LockStrategy};
pub use record_log::RecordLog;
pub use service::{CounterService, ServiceConfig};
pub use window::WindowCounter;
