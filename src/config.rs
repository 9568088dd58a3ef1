use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use crate::error::AppError;
use crate::guard::LockStrategy;
use crate::service::ServiceConfig;

// CLI argument structure; every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "window-counter")]
#[command(about = "Counts requests seen in a trailing time window, persisted to an append-only log")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "API_PORT", default_value_t = 8090)]
    pub port: u16,

    // Append-only log of request timestamps
    #[arg(short, long, env = "FILE_LOCATION", default_value = "file.txt")]
    pub file_location: PathBuf,

    // Window in seconds
    #[arg(long, env = "PREVIOUS_TIME", default_value_t = 60)]
    pub previous_time: u64,

    // Max requests inside the counter at once
    #[arg(long, env = "MAX_CONCURRENT_REQUESTS", default_value_t = 5)]
    pub max_concurrent: usize,

    // Fixed delay in seconds after admission
    #[arg(long, env = "REQUEST_DELAY", default_value_t = 2)]
    pub request_delay: u64,

    #[arg(long, env = "LOCK_STRATEGY", value_enum, default_value_t = LockStrategy::InProcess)]
    pub lock_strategy: LockStrategy,

    // Give up waiting for admission after this many seconds (unset: wait forever)
    #[arg(long, env = "ADMISSION_TIMEOUT")]
    pub admission_timeout: Option<u64>,
}

impl Args {
    pub fn service_config(&self) -> Result<ServiceConfig, AppError> {
        if self.max_concurrent == 0 {
            return Err(AppError::Config(
                "max concurrent requests must be at least 1".to_string(),
            ));
        }
        if self.file_location.as_os_str().is_empty() {
            return Err(AppError::Config("file location must not be empty".to_string()));
        }

        Ok(ServiceConfig {
            file_location: self.file_location.clone(),
            window_secs: self.previous_time,
            max_concurrent: self.max_concurrent,
            request_delay: Duration::from_secs(self.request_delay),
            lock_strategy: self.lock_strategy,
            admission_timeout: self.admission_timeout.map(Duration::from_secs),
        })
    }
}
