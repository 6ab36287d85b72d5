pub mod health;
pub mod orders;
pub mod playback;
pub mod session;
pub mod simulate;

use crate::compute::{BlockingBackend, ComputeBackend};
use crate::config::Config;
use crate::error::AppError;
use crate::orchestration::{Session, SessionSettings};
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub session: Arc<Session>,
}

impl AppState {
    pub fn new(config: Config, session: Arc<Session>) -> Self {
        Self { config, session }
    }

    /// Session backed by the blocking-pool engine.
    pub fn from_config(config: Config) -> Self {
        let backend: Arc<dyn ComputeBackend> =
            Arc::new(BlockingBackend::new(config.price_path_scenarios.clone()));
        Self::with_backend(config, backend)
    }

    pub fn with_backend(config: Config, backend: Arc<dyn ComputeBackend>) -> Self {
        let session = Arc::new(Session::new(SessionSettings::from(&config), backend));
        Self::new(config, session)
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/simulate", post(simulate::post_simulate))
        .route("/v1/price-paths", post(simulate::post_price_paths))
        .route("/v1/session", get(session::get_session))
        .route("/v1/session/snapshots", get(session::get_snapshots))
        .route("/v1/session/curves", get(session::get_curves))
        .route("/v1/session/config", put(session::put_config))
        .route("/v1/session/reset", post(session::post_reset))
        .route(
            "/v1/session/step",
            post(playback::post_step).put(playback::put_step),
        )
        .route("/v1/session/playback", put(playback::put_playback))
        .route("/v1/session/swap", post(playback::post_swap))
        .route("/v1/session/orders/limit", post(orders::post_limit_order))
        .route(
            "/v1/session/orders/limit/:id",
            delete(orders::delete_limit_order),
        )
        .route("/v1/session/orders/twap", post(orders::post_twap_order))
        .route(
            "/v1/session/orders/twap/:id",
            delete(orders::delete_twap_order),
        )
        .fallback(not_found)
        .layer(cors)
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound("no such route".to_string())
}
