//! Post-commit side effects: counters and notification enqueues.
//!
//! The committed transition is the source of truth. A failed counter bump
//! or enqueue is logged and swallowed, never surfaced to the caller, and
//! reconciled out-of-band if it matters.

use crate::db::repo::NotificationKind;
use crate::db::Repository;
use crate::domain::{Clock, Party, Trade, UserId};
use std::sync::Arc;
use tracing::warn;

/// Fire-and-forget sink for terminal-transition side effects.
pub struct SideEffects {
    repo: Arc<Repository>,
    clock: Arc<dyn Clock>,
}

impl SideEffects {
    pub fn new(repo: Arc<Repository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// A trade was posted: bump the owner's posted counter.
    pub async fn trade_posted(&self, owner: &UserId) {
        if let Err(e) = self.repo.increment_trades_posted(owner).await {
            warn!(user = %owner, error = %e, "Failed to bump trades_posted, continuing");
        }
    }

    /// A trade settled: bump both participants' completed counters and
    /// notify each of them.
    pub async fn trade_completed(&self, trade: &Trade) {
        let now = self.clock.now();
        let mut recipients = vec![trade.owner_id.clone()];
        recipients.extend(trade.joiner_id.clone());

        for user in &recipients {
            if let Err(e) = self.repo.increment_trades_completed(user).await {
                warn!(user = %user, trade = %trade.id, error = %e, "Failed to bump trades_completed, continuing");
            }
            if let Err(e) = self
                .repo
                .enqueue_notification(user, &trade.id, NotificationKind::TradeCompleted, now)
                .await
            {
                warn!(user = %user, trade = %trade.id, error = %e, "Failed to enqueue completion notification, continuing");
            }
        }
    }

    /// A trade was declined: notify the counterparty.
    pub async fn trade_declined(&self, trade: &Trade, declined_by: Party) {
        let counterparty = match declined_by {
            Party::Owner => trade.joiner_id.clone(),
            Party::Joiner => Some(trade.owner_id.clone()),
        };
        let Some(user) = counterparty else {
            return;
        };

        let now = self.clock.now();
        if let Err(e) = self
            .repo
            .enqueue_notification(&user, &trade.id, NotificationKind::TradeDeclined, now)
            .await
        {
            warn!(user = %user, trade = %trade.id, error = %e, "Failed to enqueue decline notification, continuing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use crate::domain::{ManualClock, TimeMs, TradeId, TradeStatus};
    use tempfile::TempDir;

    async fn setup() -> (SideEffects, Arc<Repository>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        let repo = Arc::new(Repository::new(pool));
        let clock = Arc::new(ManualClock::new(5000));
        (SideEffects::new(repo.clone(), clock), repo, temp_dir)
    }

    fn completed_trade() -> Trade {
        Trade {
            id: TradeId::generate(),
            owner_id: UserId::new("owner"),
            offering: vec![],
            looking_for: vec![],
            status: TradeStatus::Completed,
            joiner_id: Some(UserId::new("joiner")),
            owner_accepted: true,
            joiner_accepted: true,
            fail_reason: None,
            views: 0,
            created_at: TimeMs::new(1000),
            joined_at: Some(TimeMs::new(2000)),
            completed_at: Some(TimeMs::new(5000)),
            failed_at: None,
        }
    }

    #[tokio::test]
    async fn test_completion_touches_both_participants() {
        let (effects, repo, _temp) = setup().await;
        let trade = completed_trade();

        effects.trade_completed(&trade).await;

        for user in ["owner", "joiner"] {
            let user = UserId::new(user);
            assert_eq!(repo.get_user_stats(&user).await.unwrap().trades_completed, 1);
            let notifications = repo.list_notifications(&user).await.unwrap();
            assert_eq!(notifications.len(), 1);
            assert_eq!(notifications[0].kind, "trade_completed");
        }
    }

    #[tokio::test]
    async fn test_decline_notifies_counterparty_only() {
        let (effects, repo, _temp) = setup().await;
        let trade = completed_trade();

        effects.trade_declined(&trade, Party::Joiner).await;

        let owner_notes = repo
            .list_notifications(&UserId::new("owner"))
            .await
            .unwrap();
        assert_eq!(owner_notes.len(), 1);
        assert_eq!(owner_notes[0].kind, "trade_declined");

        let joiner_notes = repo
            .list_notifications(&UserId::new("joiner"))
            .await
            .unwrap();
        assert!(joiner_notes.is_empty());
    }
}
