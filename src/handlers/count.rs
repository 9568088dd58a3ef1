use axum::{Json, extract::State};
use std::sync::Arc;
use crate::state::AppState;
use crate::models::CountResponse;
use super::ApiError;

pub async fn count_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CountResponse>, ApiError> {
    let request_amount = state.service.get_count().await?;
    Ok(Json(CountResponse { request_amount }))
}
