//! Background expiry sweep.
//!
//! Periodically expires active, unjoined trades whose TTL has elapsed.
//! Each sweep is idempotent per trade; a trade joined mid-sweep keeps its
//! join.

use crate::engine::TradeEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Spawn the sweeper loop. Call `abort()` on the handle to stop it.
pub fn spawn_sweeper(engine: Arc<TradeEngine>, interval_ms: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match engine.sweep_expired().await {
                Ok(0) => {}
                Ok(expired) => info!(expired, "Expiry sweep completed"),
                Err(e) => warn!(error = %e, "Expiry sweep failed, will retry next tick"),
            }
        }
    })
}
