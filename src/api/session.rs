use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::compute::PricePaths;
use crate::domain::{SimulationInputs, Snapshot};
use crate::engine::Curves;
use crate::error::AppError;
use crate::orchestration::{RecomputeOutcome, SessionUpdate};
use crate::playback::PlaybackSummary;
use super::AppState;

const DEFAULT_SWAP_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    pub swaps: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub fingerprint: String,
    pub inputs: SimulationInputs,
    pub playback: PlaybackSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotsResponse {
    pub version: u64,
    pub current_step: usize,
    pub snapshots: Vec<Snapshot>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurvesResponse {
    pub curves: Curves,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_paths: Option<PricePaths>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub result: RecomputeOutcome,
    pub fingerprint: String,
    pub inputs: SimulationInputs,
}

pub async fn get_session(
    Query(params): Query<SessionQuery>,
    State(state): State<AppState>,
) -> Json<SessionResponse> {
    let inputs = state.session.inputs().await;
    let fingerprint = state.session.fingerprint().await;
    let playback = state
        .session
        .controller()
        .lock()
        .await
        .summary(params.swaps.unwrap_or(DEFAULT_SWAP_LIMIT));

    Json(SessionResponse {
        fingerprint,
        inputs,
        playback,
    })
}

pub async fn get_snapshots(State(state): State<AppState>) -> Json<SnapshotsResponse> {
    let controller = state.session.controller().lock().await;
    let market = controller.market();
    Json(SnapshotsResponse {
        version: market.version(),
        current_step: market.current_step(),
        snapshots: market.snapshots().to_vec(),
    })
}

pub async fn get_curves(State(state): State<AppState>) -> Json<CurvesResponse> {
    Json(CurvesResponse {
        curves: state.session.curves().await,
        price_paths: state.session.price_paths().await,
    })
}

pub async fn put_config(
    State(state): State<AppState>,
    Json(update): Json<SessionUpdate>,
) -> Result<Json<UpdateResponse>, AppError> {
    let result = state.session.update(update).await?;
    respond_with_inputs(&state, result).await
}

pub async fn post_reset(State(state): State<AppState>) -> Result<Json<UpdateResponse>, AppError> {
    let result = state.session.reset().await?;
    respond_with_inputs(&state, result).await
}

async fn respond_with_inputs(
    state: &AppState,
    result: RecomputeOutcome,
) -> Result<Json<UpdateResponse>, AppError> {
    Ok(Json(UpdateResponse {
        result,
        fingerprint: state.session.fingerprint().await,
        inputs: state.session.inputs().await,
    }))
}
