use std::str::FromStr;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::OrderId;
use crate::engine::TwapParams;
use crate::error::AppError;
use super::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitOrderRequest {
    pub trigger_price: f64,
    pub collateral_amount: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub id: OrderId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub id: OrderId,
    pub cancelled: bool,
}

pub async fn post_limit_order(
    State(state): State<AppState>,
    Json(request): Json<LimitOrderRequest>,
) -> Result<Json<CreatedResponse>, AppError> {
    let id = state
        .session
        .controller()
        .lock()
        .await
        .create_limit_order(request.trigger_price, request.collateral_amount)?;
    Ok(Json(CreatedResponse { id }))
}

/// Unknown and already terminal orders report `cancelled: false`.
pub async fn delete_limit_order(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CancelResponse>, AppError> {
    let id = parse_order_id(&id)?;
    let cancelled = state.session.controller().lock().await.cancel_limit_order(id);
    Ok(Json(CancelResponse { id, cancelled }))
}

pub async fn post_twap_order(
    State(state): State<AppState>,
    Json(params): Json<TwapParams>,
) -> Result<Json<CreatedResponse>, AppError> {
    let id = state
        .session
        .controller()
        .lock()
        .await
        .create_twap_order(params)?;
    Ok(Json(CreatedResponse { id }))
}

pub async fn delete_twap_order(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CancelResponse>, AppError> {
    let id = parse_order_id(&id)?;
    let cancelled = state.session.controller().lock().await.cancel_twap_order(id);
    Ok(Json(CancelResponse { id, cancelled }))
}

fn parse_order_id(raw: &str) -> Result<OrderId, AppError> {
    OrderId::from_str(raw)
        .map_err(|_| AppError::BadRequest(format!("Invalid order id: {}", raw)))
}
