//! Read-only access to the catalog owned by the external admin subsystem.

use crate::domain::{CatalogItem, ItemId, Mutation, TraitDef};
use async_trait::async_trait;
use std::fmt;

pub mod cache;
pub mod memory;
pub mod sqlite;

pub use cache::CachedCatalog;
pub use memory::MemoryCatalog;
pub use sqlite::SqliteCatalog;

/// Catalog read API.
///
/// The contract: given an item id, return its base value and
/// allowed-modifier configuration, or nothing. Writes belong to the
/// admin subsystem and never happen through this trait.
#[async_trait]
pub trait CatalogSource: Send + Sync + fmt::Debug {
    /// Fetch a catalog item by id. `None` when no such item exists.
    async fn get_item(&self, id: &ItemId) -> Result<Option<CatalogItem>, CatalogError>;

    /// All mutation definitions, ordered by id.
    async fn get_mutations(&self) -> Result<Vec<Mutation>, CatalogError>;

    /// All trait definitions, ordered by id.
    async fn get_traits(&self) -> Result<Vec<TraitDef>, CatalogError>;
}

/// Error type for catalog reads.
#[derive(Debug, Clone)]
pub enum CatalogError {
    /// Storage-level failure while reading the catalog.
    Storage(String),
    /// A catalog row violates an invariant (e.g. non-positive multiplier).
    Corrupt(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Storage(msg) => write!(f, "Catalog storage error: {}", msg),
            CatalogError::Corrupt(msg) => write!(f, "Corrupt catalog row: {}", msg),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        CatalogError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_error_display() {
        let err = CatalogError::Storage("disk io".to_string());
        assert_eq!(err.to_string(), "Catalog storage error: disk io");

        let err = CatalogError::Corrupt("multiplier must be positive".to_string());
        assert_eq!(err.to_string(), "Corrupt catalog row: multiplier must be positive");
    }
}
