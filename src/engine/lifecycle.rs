//! Trade lifecycle engine.
//!
//! States: `active -> pending -> {completed | failed}`, plus
//! `active -> cancelled` (owner) and `active -> expired` (time-driven).
//! No transition leaves a terminal state.
//!
//! Every mutating operation is one conditional store update (CAS on the
//! expected prior status). A failed CAS re-reads the record and reports
//! `Conflict` — the expected outcome of two callers racing, not a bug.

use crate::catalog::CatalogSource;
use crate::config::MAX_ITEMS_PER_SIDE;
use crate::db::repo::TradeFilter;
use crate::db::Repository;
use crate::domain::{
    Clock, ItemId, MutationId, TimeMs, Trade, TradeId, TradeItemSnapshot, TradeStatus, TraitId,
    UserId,
};
use crate::engine::effects::SideEffects;
use crate::engine::value::{snapshot_item, ModifierSelection};
use crate::error::AppError;
use crate::notify::{TradeChanged, TradeEvents};
use std::sync::Arc;
use tracing::{info, warn};

/// One item a caller wants on a trade: a catalog reference plus the
/// modifier selection to resolve at post time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeItemDraft {
    pub item_id: ItemId,
    pub mutation_id: Option<MutationId>,
    pub trait_ids: Vec<TraitId>,
}

pub struct TradeEngine {
    repo: Arc<Repository>,
    catalog: Arc<dyn CatalogSource>,
    events: Arc<TradeEvents>,
    effects: SideEffects,
    clock: Arc<dyn Clock>,
    trade_ttl_ms: i64,
}

impl TradeEngine {
    pub fn new(
        repo: Arc<Repository>,
        catalog: Arc<dyn CatalogSource>,
        events: Arc<TradeEvents>,
        effects: SideEffects,
        clock: Arc<dyn Clock>,
        trade_ttl_ms: i64,
    ) -> Self {
        Self {
            repo,
            catalog,
            events,
            effects,
            clock,
            trade_ttl_ms,
        }
    }

    /// Post a new trade listing.
    ///
    /// Both sides must hold 1..=9 items, each referencing a known catalog
    /// item. Disallowed modifier selections degrade to "no modifier"
    /// inside value resolution rather than erroring.
    pub async fn post(
        &self,
        owner: &UserId,
        offering: &[TradeItemDraft],
        looking_for: &[TradeItemDraft],
    ) -> Result<Trade, AppError> {
        validate_side("offering", offering)?;
        validate_side("lookingFor", looking_for)?;

        let mutations = self.catalog.get_mutations().await?;
        let traits = self.catalog.get_traits().await?;

        let mut offering_snapshots = Vec::with_capacity(offering.len());
        for draft in offering {
            offering_snapshots.push(self.snapshot_draft(&mutations, &traits, draft).await?);
        }
        let mut looking_for_snapshots = Vec::with_capacity(looking_for.len());
        for draft in looking_for {
            looking_for_snapshots.push(self.snapshot_draft(&mutations, &traits, draft).await?);
        }

        let trade = Trade {
            id: TradeId::generate(),
            owner_id: owner.clone(),
            offering: offering_snapshots,
            looking_for: looking_for_snapshots,
            status: TradeStatus::Active,
            joiner_id: None,
            owner_accepted: false,
            joiner_accepted: false,
            fail_reason: None,
            views: 0,
            created_at: self.clock.now(),
            joined_at: None,
            completed_at: None,
            failed_at: None,
        };

        self.repo.insert_trade(&trade).await?;
        info!(trade = %trade.id, owner = %owner, "Trade posted");

        self.effects.trade_posted(owner).await;
        self.publish(&trade);
        Ok(trade)
    }

    /// Fetch a trade and bump its views counter.
    pub async fn get(&self, id: &TradeId) -> Result<Trade, AppError> {
        let trade = self.fetch(id).await?;
        if let Err(e) = self.repo.increment_views(id).await {
            warn!(trade = %id, error = %e, "Failed to bump views, continuing");
        }
        Ok(trade)
    }

    /// List trades matching the filter.
    pub async fn list(&self, filter: &TradeFilter) -> Result<Vec<Trade>, AppError> {
        Ok(self.repo.list_trades(filter).await?)
    }

    /// Join an active trade as its counterparty.
    pub async fn join(&self, id: &TradeId, caller: &UserId) -> Result<Trade, AppError> {
        let trade = self.fetch(id).await?;
        if trade.owner_id == *caller {
            return Err(AppError::Conflict(
                "Cannot join a trade you posted".to_string(),
            ));
        }
        if trade.status != TradeStatus::Active {
            return Err(AppError::Conflict(format!(
                "Trade is {}, not active",
                trade.status
            )));
        }

        if !self.repo.try_join(id, caller, self.clock.now()).await? {
            // Lost the race between the read above and the update.
            self.fetch(id).await?;
            return Err(AppError::Conflict(
                "Trade was claimed by another caller".to_string(),
            ));
        }

        let trade = self.fetch(id).await?;
        info!(trade = %id, joiner = %caller, "Trade joined");
        self.publish(&trade);
        Ok(trade)
    }

    /// Accept a pending trade as one of its participants.
    ///
    /// Re-accepting after already having accepted is a no-op returning
    /// the current record, including after the trade completed.
    pub async fn accept(&self, id: &TradeId, caller: &UserId) -> Result<Trade, AppError> {
        let trade = self.fetch(id).await?;
        let party = trade
            .party_of(caller)
            .ok_or_else(|| AppError::Forbidden("Not a participant of this trade".to_string()))?;

        if trade.has_accepted(party)
            && matches!(trade.status, TradeStatus::Pending | TradeStatus::Completed)
        {
            return Ok(trade);
        }
        if trade.status != TradeStatus::Pending {
            return Err(AppError::Conflict(format!(
                "Trade is {}, not pending",
                trade.status
            )));
        }

        let Some(applied) = self.repo.try_accept(id, party, self.clock.now()).await? else {
            // The other participant declined (or the record vanished)
            // between the read and the update.
            self.fetch(id).await?;
            return Err(AppError::Conflict(
                "Trade left the pending state".to_string(),
            ));
        };

        let trade = self.fetch(id).await?;
        if applied.completed {
            info!(trade = %id, "Trade completed");
            self.effects.trade_completed(&trade).await;
        }
        self.publish(&trade);
        Ok(trade)
    }

    /// Decline a pending trade as one of its participants.
    pub async fn decline(&self, id: &TradeId, caller: &UserId) -> Result<Trade, AppError> {
        let trade = self.fetch(id).await?;
        let party = trade
            .party_of(caller)
            .ok_or_else(|| AppError::Forbidden("Not a participant of this trade".to_string()))?;
        if trade.status != TradeStatus::Pending {
            return Err(AppError::Conflict(format!(
                "Trade is {}, not pending",
                trade.status
            )));
        }

        let reason = party.decline_reason();
        if !self.repo.try_fail(id, reason, self.clock.now()).await? {
            self.fetch(id).await?;
            return Err(AppError::Conflict(
                "Trade left the pending state".to_string(),
            ));
        }

        let trade = self.fetch(id).await?;
        info!(trade = %id, reason = reason.as_str(), "Trade declined");
        self.effects.trade_declined(&trade, party).await;
        self.publish(&trade);
        Ok(trade)
    }

    /// Cancel an active trade as its owner.
    pub async fn cancel(&self, id: &TradeId, caller: &UserId) -> Result<Trade, AppError> {
        let trade = self.fetch(id).await?;
        if trade.owner_id != *caller {
            return Err(AppError::Forbidden(
                "Only the owner can cancel a trade".to_string(),
            ));
        }
        if trade.status != TradeStatus::Active {
            return Err(AppError::Conflict(format!(
                "Trade is {}, not active",
                trade.status
            )));
        }

        if !self.repo.try_cancel(id, caller, self.clock.now()).await? {
            self.fetch(id).await?;
            return Err(AppError::Conflict(
                "Trade left the active state".to_string(),
            ));
        }

        let trade = self.fetch(id).await?;
        info!(trade = %id, "Trade cancelled");
        self.publish(&trade);
        Ok(trade)
    }

    /// Expire an active, unjoined trade whose TTL has elapsed.
    ///
    /// Safely idempotent: called on a trade in any other state (or before
    /// the TTL is up) it returns the record unchanged.
    pub async fn expire(&self, id: &TradeId) -> Result<Trade, AppError> {
        let trade = self.fetch(id).await?;
        let now = self.clock.now();

        let due = trade.status == TradeStatus::Active
            && trade.joiner_id.is_none()
            && now.elapsed_since(trade.created_at) >= self.trade_ttl_ms;
        if !due {
            return Ok(trade);
        }

        if !self.repo.try_expire(id, now).await? {
            // A joiner slipped in; their transition wins.
            return self.fetch(id).await;
        }

        let trade = self.fetch(id).await?;
        info!(trade = %id, "Trade expired");
        self.publish(&trade);
        Ok(trade)
    }

    /// Expire every due trade. Returns how many expired.
    pub async fn sweep_expired(&self) -> Result<usize, AppError> {
        let cutoff = TimeMs::new(
            self.clock
                .now()
                .as_i64()
                .saturating_sub(self.trade_ttl_ms),
        );
        let candidates = self.repo.expiry_candidates(cutoff).await?;

        let mut expired = 0;
        for id in candidates {
            match self.expire(&id).await {
                Ok(trade) if trade.status == TradeStatus::Expired => expired += 1,
                Ok(_) => {}
                // A concurrently deleted record is not a sweep failure.
                Err(AppError::NotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(expired)
    }

    async fn fetch(&self, id: &TradeId) -> Result<Trade, AppError> {
        self.repo
            .get_trade(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Trade {} not found", id)))
    }

    async fn snapshot_draft(
        &self,
        mutations: &[crate::domain::Mutation],
        traits: &[crate::domain::TraitDef],
        draft: &TradeItemDraft,
    ) -> Result<TradeItemSnapshot, AppError> {
        let item = self
            .catalog
            .get_item(&draft.item_id)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!("Unknown catalog item: {}", draft.item_id))
            })?;

        let selection = ModifierSelection {
            mutation_id: draft.mutation_id.clone(),
            trait_ids: draft.trait_ids.clone(),
        };
        Ok(snapshot_item(mutations, traits, &item, &selection))
    }

    fn publish(&self, trade: &Trade) {
        self.events.publish(TradeChanged {
            trade_id: trade.id,
            trade: trade.clone(),
        });
    }
}

fn validate_side(side: &str, items: &[TradeItemDraft]) -> Result<(), AppError> {
    if items.is_empty() {
        return Err(AppError::Validation(format!(
            "{} must contain at least one item",
            side
        )));
    }
    if items.len() > MAX_ITEMS_PER_SIDE {
        return Err(AppError::Validation(format!(
            "{} cannot exceed {} items",
            side, MAX_ITEMS_PER_SIDE
        )));
    }
    Ok(())
}
