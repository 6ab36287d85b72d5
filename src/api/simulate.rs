use axum::extract::State;
use axum::Json;

use crate::compute::{ComputeResponse, PricePaths, PricePathsRequest, SimulationRequest};
use crate::domain::Snapshot;
use crate::error::AppError;
use super::AppState;

/// Run a stateless simulation; the session is not touched.
pub async fn post_simulate(
    State(state): State<AppState>,
    Json(request): Json<SimulationRequest>,
) -> Result<Json<ComputeResponse<Vec<Snapshot>>>, AppError> {
    let snapshots = state.session.client().simulate(request).await?;
    Ok(Json(ComputeResponse::Success { result: snapshots }))
}

pub async fn post_price_paths(
    State(state): State<AppState>,
    Json(request): Json<PricePathsRequest>,
) -> Result<Json<ComputeResponse<PricePaths>>, AppError> {
    let paths = state.session.client().price_paths(request).await?;
    Ok(Json(ComputeResponse::Success { result: paths }))
}
