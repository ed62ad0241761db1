//! Trade record operations, including the conditional transition updates
//! the lifecycle engine relies on.

use super::{snapshot_from_row, trade_from_row, Repository};
use crate::domain::{
    FailReason, Party, TimeMs, Trade, TradeId, TradeItemSnapshot, TradeStatus, UserId,
};
use crate::engine::agreement::Agreement;
use sqlx::Row;

/// Filters for listing trades.
#[derive(Debug, Clone, Default)]
pub struct TradeFilter {
    pub status: Option<TradeStatus>,
    pub participant: Option<UserId>,
    /// Substring match against offering-side item names.
    pub offering_name: Option<String>,
    /// Substring match against looking-for-side item names.
    pub looking_for_name: Option<String>,
    pub limit: i64,
}

/// Result of a successful accept CAS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptApplied {
    /// Whether this accept settled the trade (both flags now true).
    pub completed: bool,
}

impl Repository {
    /// Insert a trade and its item snapshots atomically.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn insert_trade(&self, trade: &Trade) -> Result<(), sqlx::Error> {
        let mut tx = self.pool().begin().await?;

        sqlx::query(
            r#"
            INSERT INTO trades
            (id, owner_id, status, joiner_id, owner_accepted, joiner_accepted,
             fail_reason, views, created_at, joined_at, completed_at, failed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(trade.id.to_string())
        .bind(trade.owner_id.as_str())
        .bind(trade.status.as_str())
        .bind(trade.joiner_id.as_ref().map(|j| j.as_str().to_string()))
        .bind(trade.owner_accepted as i64)
        .bind(trade.joiner_accepted as i64)
        .bind(trade.fail_reason.map(|r| r.as_str()))
        .bind(trade.views)
        .bind(trade.created_at.as_i64())
        .bind(trade.joined_at.map(|t| t.as_i64()))
        .bind(trade.completed_at.map(|t| t.as_i64()))
        .bind(trade.failed_at.map(|t| t.as_i64()))
        .execute(&mut *tx)
        .await?;

        for (side, items) in [("offering", &trade.offering), ("looking_for", &trade.looking_for)] {
            for (pos, item) in items.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO trade_items
                    (trade_id, side, pos, name, image, base_value, mutation_id, trait_ids, final_value)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(trade.id.to_string())
                .bind(side)
                .bind(pos as i64)
                .bind(&item.name)
                .bind(&item.image)
                .bind(item.base_value.to_canonical_string())
                .bind(item.mutation_id.as_ref().map(|m| m.as_str().to_string()))
                .bind(serde_json::to_string(&item.trait_ids).unwrap_or_else(|_| "[]".to_string()))
                .bind(item.final_value.to_canonical_string())
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// Fetch a trade with its item snapshots. None if no such trade.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_trade(&self, id: &TradeId) -> Result<Option<Trade>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM trades WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(self.pool())
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut trade = trade_from_row(&row)?;
        self.attach_items(&mut trade).await?;
        Ok(Some(trade))
    }

    /// List trades matching the filter, newest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_trades(&self, filter: &TradeFilter) -> Result<Vec<Trade>, sqlx::Error> {
        let mut sql = String::from("SELECT * FROM trades WHERE 1=1");
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filter.participant.is_some() {
            sql.push_str(" AND (owner_id = ? OR joiner_id = ?)");
        }
        if filter.offering_name.is_some() {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM trade_items ti WHERE ti.trade_id = trades.id \
                 AND ti.side = 'offering' AND ti.name LIKE ?)",
            );
        }
        if filter.looking_for_name.is_some() {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM trade_items ti WHERE ti.trade_id = trades.id \
                 AND ti.side = 'looking_for' AND ti.name LIKE ?)",
            );
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC LIMIT ?");

        let mut query = sqlx::query(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(participant) = &filter.participant {
            query = query
                .bind(participant.as_str().to_string())
                .bind(participant.as_str().to_string());
        }
        if let Some(name) = &filter.offering_name {
            query = query.bind(format!("%{}%", name));
        }
        if let Some(name) = &filter.looking_for_name {
            query = query.bind(format!("%{}%", name));
        }
        query = query.bind(filter.limit);

        let rows = query.fetch_all(self.pool()).await?;

        let mut trades = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut trade = trade_from_row(row)?;
            self.attach_items(&mut trade).await?;
            trades.push(trade);
        }
        Ok(trades)
    }

    async fn attach_items(&self, trade: &mut Trade) -> Result<(), sqlx::Error> {
        let rows = sqlx::query(
            "SELECT * FROM trade_items WHERE trade_id = ? ORDER BY side ASC, pos ASC",
        )
        .bind(trade.id.to_string())
        .fetch_all(self.pool())
        .await?;

        let mut offering: Vec<TradeItemSnapshot> = Vec::new();
        let mut looking_for: Vec<TradeItemSnapshot> = Vec::new();
        for row in &rows {
            let side: String = row.get("side");
            let snapshot = snapshot_from_row(row);
            if side == "offering" {
                offering.push(snapshot);
            } else {
                looking_for.push(snapshot);
            }
        }
        trade.offering = offering;
        trade.looking_for = looking_for;
        Ok(())
    }

    /// Join CAS: active -> pending, claiming the joiner slot.
    ///
    /// Returns false if the trade was not active (or does not exist); the
    /// record is left untouched in that case.
    pub async fn try_join(
        &self,
        id: &TradeId,
        joiner: &UserId,
        now: TimeMs,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE trades
            SET status = 'pending', joiner_id = ?, owner_accepted = 0,
                joiner_accepted = 0, joined_at = ?
            WHERE id = ? AND status = 'active'
            "#,
        )
        .bind(joiner.as_str())
        .bind(now.as_i64())
        .bind(id.to_string())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Accept CAS: set the caller's flag while still pending; settle to
    /// completed in the same transaction when both flags are true.
    ///
    /// Returns None if the trade was not pending (lost race or bad state).
    pub async fn try_accept(
        &self,
        id: &TradeId,
        party: Party,
        now: TimeMs,
    ) -> Result<Option<AcceptApplied>, sqlx::Error> {
        let mut tx = self.pool().begin().await?;

        let flag_sql = match party {
            Party::Owner => {
                "UPDATE trades SET owner_accepted = 1 WHERE id = ? AND status = 'pending'"
            }
            Party::Joiner => {
                "UPDATE trades SET joiner_accepted = 1 WHERE id = ? AND status = 'pending'"
            }
        };
        let result = sqlx::query(flag_sql)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.commit().await?;
            return Ok(None);
        }

        let row = sqlx::query("SELECT owner_accepted, joiner_accepted FROM trades WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(&mut *tx)
            .await?;
        let agreement = Agreement::new(
            row.get::<i64, _>("owner_accepted") != 0,
            row.get::<i64, _>("joiner_accepted") != 0,
        );

        let completed = if agreement.is_settled() {
            sqlx::query(
                "UPDATE trades SET status = 'completed', completed_at = ? \
                 WHERE id = ? AND status = 'pending'",
            )
            .bind(now.as_i64())
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?
            .rows_affected()
                > 0
        } else {
            false
        };

        tx.commit().await?;
        Ok(Some(AcceptApplied { completed }))
    }

    /// Decline CAS: pending -> failed with the given reason.
    pub async fn try_fail(
        &self,
        id: &TradeId,
        reason: FailReason,
        now: TimeMs,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE trades
            SET status = 'failed', fail_reason = ?, failed_at = ?
            WHERE id = ? AND status = 'pending'
            "#,
        )
        .bind(reason.as_str())
        .bind(now.as_i64())
        .bind(id.to_string())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Cancel CAS: active -> cancelled, owner only. The owner condition is
    /// part of the statement so an ownership check can never go stale.
    pub async fn try_cancel(
        &self,
        id: &TradeId,
        owner: &UserId,
        now: TimeMs,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE trades
            SET status = 'cancelled', fail_reason = 'cancelled', failed_at = ?
            WHERE id = ? AND status = 'active' AND owner_id = ?
            "#,
        )
        .bind(now.as_i64())
        .bind(id.to_string())
        .bind(owner.as_str())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Expire CAS: active -> expired.
    pub async fn try_expire(&self, id: &TradeId, now: TimeMs) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE trades
            SET status = 'expired', fail_reason = 'expired', failed_at = ?
            WHERE id = ? AND status = 'active'
            "#,
        )
        .bind(now.as_i64())
        .bind(id.to_string())
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Active, unjoined trades created at or before the cutoff.
    pub async fn expiry_candidates(&self, cutoff: TimeMs) -> Result<Vec<TradeId>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id FROM trades
            WHERE status = 'active' AND joiner_id IS NULL AND created_at <= ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(cutoff.as_i64())
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .iter()
            .filter_map(|row| TradeId::parse(&row.get::<String, _>("id")))
            .collect())
    }

    /// Bump the views counter.
    pub async fn increment_views(&self, id: &TradeId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE trades SET views = views + 1 WHERE id = ?")
            .bind(id.to_string())
            .execute(self.pool())
            .await?;
        Ok(())
    }
}
