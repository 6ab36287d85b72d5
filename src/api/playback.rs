use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::Side;
use crate::engine::Execution;
use crate::error::AppError;
use crate::playback::TickOutcome;
use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRequest {
    pub step: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResponse {
    pub current_step: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackRequest {
    pub playing: Option<bool>,
    pub speed: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackResponse {
    pub playing: bool,
    pub speed: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub side: Side,
    /// Collateral for buys, tokens for sells.
    pub amount: f64,
}

/// Advance one step, exactly like a ticker tick.
pub async fn post_step(State(state): State<AppState>) -> Json<TickOutcome> {
    let outcome = state.session.controller().lock().await.advance_one_step();
    Json(outcome)
}

pub async fn put_step(
    State(state): State<AppState>,
    Json(request): Json<StepRequest>,
) -> Json<StepResponse> {
    let current_step = state
        .session
        .controller()
        .lock()
        .await
        .set_step_pointer(request.step);
    Json(StepResponse { current_step })
}

pub async fn put_playback(
    State(state): State<AppState>,
    Json(request): Json<PlaybackRequest>,
) -> Result<Json<PlaybackResponse>, AppError> {
    let player = state.session.player();
    if let Some(speed) = request.speed {
        if !speed.is_finite() {
            return Err(AppError::BadRequest("speed must be a finite number".to_string()));
        }
        player.set_speed(speed).await;
    }
    if let Some(playing) = request.playing {
        player.set_playing(playing).await;
    }

    let controller = state.session.controller().lock().await;
    Ok(Json(PlaybackResponse {
        playing: controller.is_playing(),
        speed: controller.speed(),
    }))
}

pub async fn post_swap(
    State(state): State<AppState>,
    Json(request): Json<SwapRequest>,
) -> Result<Json<Execution>, AppError> {
    let mut controller = state.session.controller().lock().await;
    let execution = match request.side {
        Side::Buy => controller.process_buy(request.amount)?,
        Side::Sell => controller.process_sell(request.amount)?,
    };
    Ok(Json(execution))
}
