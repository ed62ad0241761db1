//! User counters and the notification outbox.

use super::Repository;
use crate::domain::{TimeMs, TradeId, UserId};
use sqlx::Row;

/// Per-user lifetime counters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserStats {
    pub trades_posted: i64,
    pub trades_completed: i64,
}

/// Notification categories enqueued on terminal transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    TradeCompleted,
    TradeDeclined,
}

impl NotificationKind {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::TradeCompleted => "trade_completed",
            NotificationKind::TradeDeclined => "trade_declined",
        }
    }
}

/// A queued notification row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRow {
    pub user_id: UserId,
    pub trade_id: TradeId,
    pub kind: String,
    pub created_at: TimeMs,
}

impl Repository {
    /// Bump a user's posted-trades counter, creating the row if needed.
    pub async fn increment_trades_posted(&self, user: &UserId) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO user_stats (user_id, trades_posted, trades_completed)
            VALUES (?, 1, 0)
            ON CONFLICT(user_id) DO UPDATE SET trades_posted = trades_posted + 1
            "#,
        )
        .bind(user.as_str())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Bump a user's completed-trades counter, creating the row if needed.
    pub async fn increment_trades_completed(&self, user: &UserId) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO user_stats (user_id, trades_posted, trades_completed)
            VALUES (?, 0, 1)
            ON CONFLICT(user_id) DO UPDATE SET trades_completed = trades_completed + 1
            "#,
        )
        .bind(user.as_str())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Read a user's counters. Zeroes if the user has no row yet.
    pub async fn get_user_stats(&self, user: &UserId) -> Result<UserStats, sqlx::Error> {
        let row = sqlx::query(
            "SELECT trades_posted, trades_completed FROM user_stats WHERE user_id = ?",
        )
        .bind(user.as_str())
        .fetch_optional(self.pool())
        .await?;

        Ok(row
            .map(|r| UserStats {
                trades_posted: r.get("trades_posted"),
                trades_completed: r.get("trades_completed"),
            })
            .unwrap_or_default())
    }

    /// Enqueue a user-facing notification. Delivery happens out-of-band.
    pub async fn enqueue_notification(
        &self,
        user: &UserId,
        trade: &TradeId,
        kind: NotificationKind,
        now: TimeMs,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, trade_id, kind, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user.as_str())
        .bind(trade.to_string())
        .bind(kind.as_str())
        .bind(now.as_i64())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Queued notifications for a user, oldest first.
    pub async fn list_notifications(
        &self,
        user: &UserId,
    ) -> Result<Vec<NotificationRow>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, trade_id, kind, created_at
            FROM notifications
            WHERE user_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user.as_str())
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .iter()
            .filter_map(|row| {
                let trade_id = TradeId::parse(&row.get::<String, _>("trade_id"))?;
                Some(NotificationRow {
                    user_id: UserId::new(row.get::<String, _>("user_id")),
                    trade_id,
                    kind: row.get("kind"),
                    created_at: TimeMs::new(row.get("created_at")),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use tempfile::TempDir;

    async fn setup_repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    #[tokio::test]
    async fn test_counters_upsert_from_zero() {
        let (repo, _temp) = setup_repo().await;
        let user = UserId::new("alice");

        assert_eq!(repo.get_user_stats(&user).await.unwrap(), UserStats::default());

        repo.increment_trades_posted(&user).await.unwrap();
        repo.increment_trades_posted(&user).await.unwrap();
        repo.increment_trades_completed(&user).await.unwrap();

        let stats = repo.get_user_stats(&user).await.unwrap();
        assert_eq!(stats.trades_posted, 2);
        assert_eq!(stats.trades_completed, 1);
    }

    #[tokio::test]
    async fn test_notification_queue_ordering() {
        let (repo, _temp) = setup_repo().await;
        let user = UserId::new("alice");
        let t1 = TradeId::generate();
        let t2 = TradeId::generate();

        repo.enqueue_notification(&user, &t1, NotificationKind::TradeDeclined, TimeMs::new(2000))
            .await
            .unwrap();
        repo.enqueue_notification(&user, &t2, NotificationKind::TradeCompleted, TimeMs::new(1000))
            .await
            .unwrap();

        let rows = repo.list_notifications(&user).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].trade_id, t2);
        assert_eq!(rows[0].kind, "trade_completed");
        assert_eq!(rows[1].trade_id, t1);
    }
}
