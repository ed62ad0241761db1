pub mod events;
pub mod health;
pub mod trades;

use crate::engine::TradeEngine;
use crate::notify::TradeEvents;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<TradeEngine>,
    pub events: Arc<TradeEvents>,
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/trades", get(trades::list_trades).post(trades::post_trade))
        .route(
            "/v1/trades/:id",
            get(trades::get_trade).delete(trades::cancel_trade),
        )
        .route("/v1/trades/:id/join", post(trades::join_trade))
        .route("/v1/trades/:id/accept", post(trades::accept_trade))
        .route("/v1/trades/:id/decline", post(trades::decline_trade))
        .route("/v1/trades/:id/events", get(events::trade_events))
        .layer(cors)
        .with_state(state)
}
