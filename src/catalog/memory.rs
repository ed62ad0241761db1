//! In-memory catalog source for tests and previews.

use super::{CatalogError, CatalogSource};
use crate::domain::{CatalogItem, ItemId, Mutation, TraitDef};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Catalog source backed by in-process maps.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    items: BTreeMap<ItemId, CatalogItem>,
    mutations: Vec<Mutation>,
    traits: Vec<TraitDef>,
}

impl MemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a catalog item.
    pub fn with_item(mut self, item: CatalogItem) -> Self {
        self.items.insert(item.id.clone(), item);
        self
    }

    /// Add a mutation definition.
    pub fn with_mutation(mut self, mutation: Mutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    /// Add a trait definition.
    pub fn with_trait(mut self, trait_def: TraitDef) -> Self {
        self.traits.push(trait_def);
        self
    }
}

#[async_trait]
impl CatalogSource for MemoryCatalog {
    async fn get_item(&self, id: &ItemId) -> Result<Option<CatalogItem>, CatalogError> {
        Ok(self.items.get(id).cloned())
    }

    async fn get_mutations(&self) -> Result<Vec<Mutation>, CatalogError> {
        let mut mutations = self.mutations.clone();
        mutations.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(mutations)
    }

    async fn get_traits(&self) -> Result<Vec<TraitDef>, CatalogError> {
        let mut traits = self.traits.clone();
        traits.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(traits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Demand, Multiplier, MutationId, Value};
    use std::str::FromStr;

    fn item(id: &str) -> CatalogItem {
        CatalogItem {
            id: ItemId::new(id),
            name: id.to_string(),
            image: format!("{}.png", id),
            base_value: Value::from_str("10").unwrap(),
            demand: Demand::Medium,
            allowed_mutations: BTreeMap::new(),
            allowed_traits: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_get_item_and_miss() {
        let catalog = MemoryCatalog::new().with_item(item("dragon"));
        assert!(catalog
            .get_item(&ItemId::new("dragon"))
            .await
            .unwrap()
            .is_some());
        assert!(catalog
            .get_item(&ItemId::new("unicorn"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_mutations_sorted_by_id() {
        let catalog = MemoryCatalog::new()
            .with_mutation(Mutation {
                id: MutationId::new("zeta"),
                name: "Zeta".to_string(),
                multiplier: Multiplier::from_str("3").unwrap(),
            })
            .with_mutation(Mutation {
                id: MutationId::new("alpha"),
                name: "Alpha".to_string(),
                multiplier: Multiplier::from_str("2").unwrap(),
            });

        let mutations = catalog.get_mutations().await.unwrap();
        assert_eq!(mutations[0].id, MutationId::new("alpha"));
        assert_eq!(mutations[1].id, MutationId::new("zeta"));
    }
}
