//! Trade records and lifecycle status vocabulary.

use crate::domain::{MutationId, TimeMs, TradeId, TraitId, UserId, Value};
use serde::{Deserialize, Serialize};

/// Trade lifecycle status.
///
/// `active -> pending -> {completed | failed}`, plus `active -> cancelled`
/// and `active -> expired`. Terminal states accept no further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Active,
    Pending,
    Completed,
    Failed,
    Cancelled,
    Expired,
}

impl TradeStatus {
    /// Whether this status is terminal (no further transitions expected).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TradeStatus::Completed
                | TradeStatus::Failed
                | TradeStatus::Cancelled
                | TradeStatus::Expired
        )
    }

    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Active => "active",
            TradeStatus::Pending => "pending",
            TradeStatus::Completed => "completed",
            TradeStatus::Failed => "failed",
            TradeStatus::Cancelled => "cancelled",
            TradeStatus::Expired => "expired",
        }
    }

    /// Parse a status from its stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(TradeStatus::Active),
            "pending" => Some(TradeStatus::Pending),
            "completed" => Some(TradeStatus::Completed),
            "failed" => Some(TradeStatus::Failed),
            "cancelled" => Some(TradeStatus::Cancelled),
            "expired" => Some(TradeStatus::Expired),
            _ => None,
        }
    }
}

impl std::fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a trade ended in `failed` (or another non-completed terminal state).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailReason {
    OwnerDeclined,
    JoinerDeclined,
    Cancelled,
    Expired,
}

impl FailReason {
    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailReason::OwnerDeclined => "owner_declined",
            FailReason::JoinerDeclined => "joiner_declined",
            FailReason::Cancelled => "cancelled",
            FailReason::Expired => "expired",
        }
    }

    /// Parse a reason from its stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "owner_declined" => Some(FailReason::OwnerDeclined),
            "joiner_declined" => Some(FailReason::JoinerDeclined),
            "cancelled" => Some(FailReason::Cancelled),
            "expired" => Some(FailReason::Expired),
            _ => None,
        }
    }
}

/// Which side of a trade a participant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    Owner,
    Joiner,
}

impl Party {
    /// The fail reason produced when this party declines.
    pub fn decline_reason(self) -> FailReason {
        match self {
            Party::Owner => FailReason::OwnerDeclined,
            Party::Joiner => FailReason::JoinerDeclined,
        }
    }
}

/// The immutable, already-resolved state of one item on a trade.
///
/// Computed once at post time through the value resolution engine; later
/// catalog or modifier edits never change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeItemSnapshot {
    pub name: String,
    pub image: String,
    pub base_value: Value,
    pub mutation_id: Option<MutationId>,
    pub trait_ids: Vec<TraitId>,
    pub final_value: Value,
}

/// A trade record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: TradeId,
    pub owner_id: UserId,
    pub offering: Vec<TradeItemSnapshot>,
    pub looking_for: Vec<TradeItemSnapshot>,
    pub status: TradeStatus,
    pub joiner_id: Option<UserId>,
    pub owner_accepted: bool,
    pub joiner_accepted: bool,
    pub fail_reason: Option<FailReason>,
    pub views: i64,
    pub created_at: TimeMs,
    pub joined_at: Option<TimeMs>,
    pub completed_at: Option<TimeMs>,
    pub failed_at: Option<TimeMs>,
}

impl Trade {
    /// Which party the caller is, if they participate in this trade.
    pub fn party_of(&self, caller: &UserId) -> Option<Party> {
        if &self.owner_id == caller {
            Some(Party::Owner)
        } else if self.joiner_id.as_ref() == Some(caller) {
            Some(Party::Joiner)
        } else {
            None
        }
    }

    /// Whether the given party has already set its accept flag.
    pub fn has_accepted(&self, party: Party) -> bool {
        match party {
            Party::Owner => self.owner_accepted,
            Party::Joiner => self.joiner_accepted,
        }
    }

    /// Sum of final values on the offering side.
    pub fn offering_total(&self) -> Value {
        self.offering
            .iter()
            .fold(Value::zero(), |acc, item| acc + item.final_value)
    }

    /// Sum of final values on the looking-for side.
    pub fn looking_for_total(&self) -> Value {
        self.looking_for
            .iter()
            .fold(Value::zero(), |acc, item| acc + item.final_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn snapshot(value: &str) -> TradeItemSnapshot {
        TradeItemSnapshot {
            name: "Dragon".to_string(),
            image: "dragon.png".to_string(),
            base_value: Value::from_str(value).unwrap(),
            mutation_id: None,
            trait_ids: vec![],
            final_value: Value::from_str(value).unwrap(),
        }
    }

    fn trade() -> Trade {
        Trade {
            id: TradeId::generate(),
            owner_id: UserId::new("owner"),
            offering: vec![snapshot("5"), snapshot("7")],
            looking_for: vec![snapshot("10")],
            status: TradeStatus::Active,
            joiner_id: Some(UserId::new("joiner")),
            owner_accepted: false,
            joiner_accepted: false,
            fail_reason: None,
            views: 0,
            created_at: TimeMs::new(1000),
            joined_at: None,
            completed_at: None,
            failed_at: None,
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!TradeStatus::Active.is_terminal());
        assert!(!TradeStatus::Pending.is_terminal());
        assert!(TradeStatus::Completed.is_terminal());
        assert!(TradeStatus::Failed.is_terminal());
        assert!(TradeStatus::Cancelled.is_terminal());
        assert!(TradeStatus::Expired.is_terminal());
    }

    #[test]
    fn test_status_parse_roundtrip() {
        for s in [
            "active",
            "pending",
            "completed",
            "failed",
            "cancelled",
            "expired",
        ] {
            assert_eq!(TradeStatus::parse(s).unwrap().as_str(), s);
        }
        assert!(TradeStatus::parse("open").is_none());
    }

    #[test]
    fn test_fail_reason_roundtrip() {
        for s in ["owner_declined", "joiner_declined", "cancelled", "expired"] {
            assert_eq!(FailReason::parse(s).unwrap().as_str(), s);
        }
    }

    #[test]
    fn test_party_of() {
        let t = trade();
        assert_eq!(t.party_of(&UserId::new("owner")), Some(Party::Owner));
        assert_eq!(t.party_of(&UserId::new("joiner")), Some(Party::Joiner));
        assert_eq!(t.party_of(&UserId::new("stranger")), None);
    }

    #[test]
    fn test_side_totals() {
        let t = trade();
        assert_eq!(t.offering_total(), Value::from_str("12").unwrap());
        assert_eq!(t.looking_for_total(), Value::from_str("10").unwrap());
    }

    #[test]
    fn test_decline_reason_by_party() {
        assert_eq!(Party::Owner.decline_reason(), FailReason::OwnerDeclined);
        assert_eq!(Party::Joiner.decline_reason(), FailReason::JoinerDeclined);
    }
}
