use axum::{Router, routing::get};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use crate::config::Args;
use crate::error::AppError;
use crate::handlers::{count_handler, health_handler, metrics_handler, not_found_handler};
use crate::service::{CounterService, ServiceConfig};
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(count_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

// Built once in main; owns the service and the bound listener.
pub struct Application {
    service: Arc<CounterService>,
    listener: TcpListener,
}

impl Application {
    pub async fn build(args: &Args) -> Result<Self, AppError> {
        let config = args.service_config()?;
        Self::with_config(&config, &format!("0.0.0.0:{}", args.port)).await
    }

    pub async fn with_config(config: &ServiceConfig, addr: &str) -> Result<Self, AppError> {
        let service = Arc::new(CounterService::new(config)?);
        let listener = TcpListener::bind(addr).await.map_err(|source| AppError::Bind {
            addr: addr.to_string(),
            source,
        })?;

        Ok(Self { service, listener })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, AppError> {
        self.listener.local_addr().map_err(AppError::Serve)
    }

    // Serves until `shutdown` resolves, then drains requests and releases the log
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        let app = router(Arc::new(AppState { service: Arc::clone(&self.service) }));

        info!(%addr, "window counter listening");
        let served = axum::serve(self.listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(AppError::Serve);

        if let Err(e) = self.service.shutdown() {
            warn!(error = %e, "error while releasing the record log");
            served?;
            return Err(e.into());
        }
        served
    }
}
