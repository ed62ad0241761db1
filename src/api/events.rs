//! Server-sent-events adapter over the trade change channel.
//!
//! Transport detail only: the engine publishes `TradeChanged` events and
//! this endpoint relays them; a lagging stream skips to the newest events
//! rather than stalling the publisher.

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use tokio::sync::broadcast;

use super::AppState;
use crate::error::AppError;

pub async fn trade_events(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let id = crate::domain::TradeId::parse(&id)
        .ok_or_else(|| AppError::NotFound(format!("Trade {} not found", id)))?;

    // Subscribe before the existence check so a transition between the two
    // cannot be missed.
    let rx = state.events.subscribe(id);
    if let Err(e) = state.engine.get(&id).await {
        drop(rx);
        state.events.prune_idle(&id);
        return Err(e);
    }

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(changed) => {
                    let event = match serde_json::to_string(&changed) {
                        Ok(data) => Event::default().event("trade_changed").data(data),
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to serialize trade event, skipping");
                            continue;
                        }
                    };
                    return Some((Ok(event), rx));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "SSE subscriber lagged, skipping to newest");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
