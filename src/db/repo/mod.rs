//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by domain:
//! - `trades.rs` - Trade records, snapshots, and conditional transitions
//! - `stats.rs` - User counters and the notification outbox
//!
//! Every lifecycle transition is a single status-conditioned update inside
//! one transaction; `rows_affected == 0` tells the caller it lost a race.

mod stats;
mod trades;

use crate::domain::{
    FailReason, TimeMs, Trade, TradeId, TradeItemSnapshot, TradeStatus, UserId, Value,
};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::warn;

pub use stats::{NotificationKind, NotificationRow, UserStats};
pub use trades::{AcceptApplied, TradeFilter};

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Map a trades row to a Trade with empty item lists; the caller attaches
/// snapshots loaded from trade_items.
pub(crate) fn trade_from_row(row: &SqliteRow) -> Result<Trade, sqlx::Error> {
    let id_str: String = row.get("id");
    let id = TradeId::parse(&id_str)
        .ok_or_else(|| sqlx::Error::Decode(format!("invalid trade id: {}", id_str).into()))?;

    let status_str: String = row.get("status");
    let status = TradeStatus::parse(&status_str).ok_or_else(|| {
        sqlx::Error::Decode(format!("invalid trade status: {}", status_str).into())
    })?;

    let fail_reason = row
        .get::<Option<String>, _>("fail_reason")
        .as_deref()
        .and_then(FailReason::parse);

    Ok(Trade {
        id,
        owner_id: UserId::new(row.get::<String, _>("owner_id")),
        offering: Vec::new(),
        looking_for: Vec::new(),
        status,
        joiner_id: row.get::<Option<String>, _>("joiner_id").map(UserId::new),
        owner_accepted: row.get::<i64, _>("owner_accepted") != 0,
        joiner_accepted: row.get::<i64, _>("joiner_accepted") != 0,
        fail_reason,
        views: row.get("views"),
        created_at: TimeMs::new(row.get("created_at")),
        joined_at: row.get::<Option<i64>, _>("joined_at").map(TimeMs::new),
        completed_at: row.get::<Option<i64>, _>("completed_at").map(TimeMs::new),
        failed_at: row.get::<Option<i64>, _>("failed_at").map(TimeMs::new),
    })
}

/// Map a trade_items row to a snapshot.
pub(crate) fn snapshot_from_row(row: &SqliteRow) -> TradeItemSnapshot {
    let base_value_str: String = row.get("base_value");
    let final_value_str: String = row.get("final_value");
    let trait_ids_json: String = row.get("trait_ids");

    let base_value = Value::from_str_canonical(&base_value_str).unwrap_or_else(|e| {
        warn!(base_value = %base_value_str, error = %e, "Failed to parse snapshot base value, using zero");
        Value::zero()
    });
    let final_value = Value::from_str_canonical(&final_value_str).unwrap_or_else(|e| {
        warn!(final_value = %final_value_str, error = %e, "Failed to parse snapshot final value, using zero");
        Value::zero()
    });
    let trait_ids = serde_json::from_str(&trait_ids_json).unwrap_or_else(|e| {
        warn!(trait_ids = %trait_ids_json, error = %e, "Failed to parse snapshot trait ids, using empty list");
        Vec::new()
    });

    TradeItemSnapshot {
        name: row.get("name"),
        image: row.get("image"),
        base_value,
        mutation_id: row
            .get::<Option<String>, _>("mutation_id")
            .map(crate::domain::MutationId::new),
        trait_ids,
        final_value,
    }
}
