//! Change notification channel for trade state transitions.
//!
//! The lifecycle engine publishes the post-transition record after every
//! committed mutation; viewers subscribe per trade id. Fan-out is
//! best-effort: no subscriber, slow subscriber, or lagging receiver ever
//! affects the mutation path.

use crate::domain::{Trade, TradeId};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::broadcast;

/// Buffered events per trade channel; laggards drop oldest first.
const CHANNEL_CAPACITY: usize = 32;

/// Event published after each committed transition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeChanged {
    pub trade_id: TradeId,
    pub trade: Trade,
}

/// Per-trade broadcast channel registry.
pub struct TradeEvents {
    channels: Mutex<HashMap<TradeId, broadcast::Sender<TradeChanged>>>,
}

impl TradeEvents {
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribe to transitions of one trade.
    pub fn subscribe(&self, trade_id: TradeId) -> broadcast::Receiver<TradeChanged> {
        let mut channels = self.lock_channels();
        channels
            .entry(trade_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publish a committed transition to current subscribers.
    ///
    /// Channels with no remaining receivers are dropped here, so the
    /// registry does not grow with the total number of trades ever touched.
    pub fn publish(&self, event: TradeChanged) {
        let mut channels = self.lock_channels();
        let Some(sender) = channels.get(&event.trade_id) else {
            return;
        };
        if sender.send(event.clone()).is_err() {
            channels.remove(&event.trade_id);
        }
    }

    /// Drop a trade's channel if it has no receivers left.
    pub fn prune_idle(&self, trade_id: &TradeId) {
        let mut channels = self.lock_channels();
        if channels
            .get(trade_id)
            .is_some_and(|sender| sender.receiver_count() == 0)
        {
            channels.remove(trade_id);
        }
    }

    /// Number of live trade channels (for tests and diagnostics).
    pub fn channel_count(&self) -> usize {
        self.lock_channels().len()
    }

    fn lock_channels(&self) -> std::sync::MutexGuard<'_, HashMap<TradeId, broadcast::Sender<TradeChanged>>> {
        // A poisoned lock only means another thread panicked mid-insert;
        // the map itself stays usable.
        self.channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for TradeEvents {
    fn default() -> Self {
        Self::new()
    }
}
