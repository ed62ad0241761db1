//! Catalog definitions: items, mutations, traits, per-item overrides.
//!
//! The catalog is owned by the external admin subsystem; these types are
//! the read-only view the marketplace core consumes.

use crate::domain::{ItemId, Multiplier, MutationId, TraitId, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Demand tier attached to a catalog item. Presentation metadata; plays no
/// part in value computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Demand {
    Low,
    Medium,
    High,
    Insane,
}

impl Demand {
    /// Parse a demand tier from its stored string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Demand::Low),
            "medium" => Some(Demand::Medium),
            "high" => Some(Demand::High),
            "insane" => Some(Demand::Insane),
            _ => None,
        }
    }

    /// Stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Demand::Low => "low",
            Demand::Medium => "medium",
            Demand::High => "high",
            Demand::Insane => "insane",
        }
    }
}

/// A single-select value modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutation {
    pub id: MutationId,
    pub name: String,
    /// Default multiplier, positive. A per-item override may replace it.
    pub multiplier: Multiplier,
}

/// A multi-select, stacking value modifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitDef {
    pub id: TraitId,
    pub name: String,
    /// Default multiplier, positive. A per-item override may replace it.
    pub multiplier: Multiplier,
}

/// Per-item override for an allowed mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationOverride {
    /// Replacement multiplier; falls back to the mutation default when None.
    pub multiplier: Option<Multiplier>,
    /// Replacement image shown when this mutation is selected.
    pub image: Option<String>,
}

/// Per-item override for an allowed trait.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitOverride {
    /// Replacement multiplier; falls back to the trait default when None.
    pub multiplier: Option<Multiplier>,
}

/// A tradeable item definition from the external catalog.
///
/// `allowed_mutations` / `allowed_traits` use BTreeMap so iteration order is
/// stable across processes; resolution order must not depend on hash seeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    pub image: String,
    pub base_value: Value,
    pub demand: Demand,
    pub allowed_mutations: BTreeMap<MutationId, MutationOverride>,
    pub allowed_traits: BTreeMap<TraitId, TraitOverride>,
}

impl CatalogItem {
    /// Whether the item permits the given mutation.
    pub fn permits_mutation(&self, id: &MutationId) -> bool {
        self.allowed_mutations.contains_key(id)
    }

    /// Whether the item permits the given trait.
    pub fn permits_trait(&self, id: &TraitId) -> bool {
        self.allowed_traits.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn item_with_mutation(mutation: &str) -> CatalogItem {
        let mut allowed = BTreeMap::new();
        allowed.insert(MutationId::new(mutation), MutationOverride::default());
        CatalogItem {
            id: ItemId::new("dragon"),
            name: "Dragon".to_string(),
            image: "dragon.png".to_string(),
            base_value: Value::from_str("100").unwrap(),
            demand: Demand::High,
            allowed_mutations: allowed,
            allowed_traits: BTreeMap::new(),
        }
    }

    #[test]
    fn test_permits_mutation() {
        let item = item_with_mutation("shiny");
        assert!(item.permits_mutation(&MutationId::new("shiny")));
        assert!(!item.permits_mutation(&MutationId::new("mega")));
    }

    #[test]
    fn test_demand_parse_roundtrip() {
        for tier in ["low", "medium", "high", "insane"] {
            assert_eq!(Demand::parse(tier).unwrap().as_str(), tier);
        }
        assert!(Demand::parse("extreme").is_none());
    }
}
