//! Read-through catalog cache with TTL-based freshness.
//!
//! Constructed once per process and passed by reference; time is injected
//! through the `Clock` trait so tests control invalidation deterministically.

use super::{CatalogError, CatalogSource};
use crate::domain::{CatalogItem, Clock, ItemId, Mutation, TimeMs, TraitDef};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct Cached<T> {
    value: T,
    fetched_at: TimeMs,
}

impl<T> Cached<T> {
    fn is_fresh(&self, now: TimeMs, ttl_ms: i64) -> bool {
        now.elapsed_since(self.fetched_at) <= ttl_ms
    }
}

/// TTL cache wrapping another catalog source.
///
/// Negative lookups (missing items) are cached too, so repeated posts
/// naming an unknown id do not hammer the inner source.
pub struct CachedCatalog<S> {
    inner: S,
    clock: Arc<dyn Clock>,
    ttl_ms: i64,
    items: Mutex<HashMap<ItemId, Cached<Option<CatalogItem>>>>,
    mutations: Mutex<Option<Cached<Vec<Mutation>>>>,
    traits: Mutex<Option<Cached<Vec<TraitDef>>>>,
}

impl<S: CatalogSource> CachedCatalog<S> {
    /// Wrap a source with the given TTL.
    pub fn new(inner: S, clock: Arc<dyn Clock>, ttl_ms: i64) -> Self {
        Self {
            inner,
            clock,
            ttl_ms,
            items: Mutex::new(HashMap::new()),
            mutations: Mutex::new(None),
            traits: Mutex::new(None),
        }
    }
}

impl<S> std::fmt::Debug for CachedCatalog<S>
where
    S: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedCatalog")
            .field("inner", &self.inner)
            .field("ttl_ms", &self.ttl_ms)
            .finish()
    }
}

#[async_trait]
impl<S: CatalogSource> CatalogSource for CachedCatalog<S> {
    async fn get_item(&self, id: &ItemId) -> Result<Option<CatalogItem>, CatalogError> {
        let now = self.clock.now();
        let mut items = self.items.lock().await;

        if let Some(cached) = items.get(id) {
            if cached.is_fresh(now, self.ttl_ms) {
                return Ok(cached.value.clone());
            }
        }

        let value = self.inner.get_item(id).await?;
        items.insert(
            id.clone(),
            Cached {
                value: value.clone(),
                fetched_at: now,
            },
        );
        Ok(value)
    }

    async fn get_mutations(&self) -> Result<Vec<Mutation>, CatalogError> {
        let now = self.clock.now();
        let mut slot = self.mutations.lock().await;

        if let Some(cached) = slot.as_ref() {
            if cached.is_fresh(now, self.ttl_ms) {
                return Ok(cached.value.clone());
            }
        }

        let value = self.inner.get_mutations().await?;
        *slot = Some(Cached {
            value: value.clone(),
            fetched_at: now,
        });
        Ok(value)
    }

    async fn get_traits(&self) -> Result<Vec<TraitDef>, CatalogError> {
        let now = self.clock.now();
        let mut slot = self.traits.lock().await;

        if let Some(cached) = slot.as_ref() {
            if cached.is_fresh(now, self.ttl_ms) {
                return Ok(cached.value.clone());
            }
        }

        let value = self.inner.get_traits().await?;
        *slot = Some(Cached {
            value: value.clone(),
            fetched_at: now,
        });
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MemoryCatalog;
    use crate::domain::{Demand, ManualClock, Value};
    use std::collections::BTreeMap;
    use std::str::FromStr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counting wrapper to observe inner fetches.
    #[derive(Debug)]
    struct CountingSource {
        inner: MemoryCatalog,
        item_fetches: AtomicUsize,
    }

    #[async_trait]
    impl CatalogSource for CountingSource {
        async fn get_item(&self, id: &ItemId) -> Result<Option<CatalogItem>, CatalogError> {
            self.item_fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.get_item(id).await
        }

        async fn get_mutations(&self) -> Result<Vec<Mutation>, CatalogError> {
            self.inner.get_mutations().await
        }

        async fn get_traits(&self) -> Result<Vec<TraitDef>, CatalogError> {
            self.inner.get_traits().await
        }
    }

    fn item(id: &str) -> CatalogItem {
        CatalogItem {
            id: ItemId::new(id),
            name: id.to_string(),
            image: format!("{}.png", id),
            base_value: Value::from_str("10").unwrap(),
            demand: Demand::Low,
            allowed_mutations: BTreeMap::new(),
            allowed_traits: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_fresh_hit_skips_inner() {
        let clock = Arc::new(ManualClock::new(0));
        let source = CountingSource {
            inner: MemoryCatalog::new().with_item(item("dragon")),
            item_fetches: AtomicUsize::new(0),
        };
        let cached = CachedCatalog::new(source, clock.clone(), 1000);

        let id = ItemId::new("dragon");
        cached.get_item(&id).await.unwrap();
        clock.advance(500);
        cached.get_item(&id).await.unwrap();

        assert_eq!(cached.inner.item_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_entry_refetches() {
        let clock = Arc::new(ManualClock::new(0));
        let source = CountingSource {
            inner: MemoryCatalog::new().with_item(item("dragon")),
            item_fetches: AtomicUsize::new(0),
        };
        let cached = CachedCatalog::new(source, clock.clone(), 1000);

        let id = ItemId::new("dragon");
        cached.get_item(&id).await.unwrap();
        clock.advance(1001);
        cached.get_item(&id).await.unwrap();

        assert_eq!(cached.inner.item_fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_negative_lookup_cached() {
        let clock = Arc::new(ManualClock::new(0));
        let source = CountingSource {
            inner: MemoryCatalog::new(),
            item_fetches: AtomicUsize::new(0),
        };
        let cached = CachedCatalog::new(source, clock, 1000);

        let id = ItemId::new("ghost");
        assert!(cached.get_item(&id).await.unwrap().is_none());
        assert!(cached.get_item(&id).await.unwrap().is_none());
        assert_eq!(cached.inner.item_fetches.load(Ordering::SeqCst), 1);
    }
}
