use std::sync::Arc;
use crate::service::CounterService;
// app's shared state

pub struct AppState {
    pub service: Arc<CounterService>,
}
