//! SQLite-backed catalog source.
//!
//! Reads the catalog tables owned by the admin subsystem. All rows are
//! validated on the way out: a non-positive multiplier is reported as a
//! corrupt row rather than silently propagated into trade values.

use super::{CatalogError, CatalogSource};
use crate::domain::{
    CatalogItem, Demand, ItemId, Multiplier, Mutation, MutationId, MutationOverride, TraitDef,
    TraitId, TraitOverride, Value,
};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::collections::BTreeMap;

/// Catalog source reading from the shared SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Create a catalog source over the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        SqliteCatalog { pool }
    }
}

#[async_trait]
impl CatalogSource for SqliteCatalog {
    async fn get_item(&self, id: &ItemId) -> Result<Option<CatalogItem>, CatalogError> {
        let row = sqlx::query(
            "SELECT id, name, image, base_value, demand FROM catalog_items WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let name: String = row.get("name");
        let image: String = row.get("image");
        let base_value_str: String = row.get("base_value");
        let demand_str: String = row.get("demand");

        let base_value = Value::from_str_canonical(&base_value_str).map_err(|e| {
            CatalogError::Corrupt(format!("item {} base_value: {}", id, e))
        })?;
        if base_value.is_negative() {
            return Err(CatalogError::Corrupt(format!(
                "item {} base_value is negative",
                id
            )));
        }
        let demand = Demand::parse(&demand_str)
            .ok_or_else(|| CatalogError::Corrupt(format!("item {} demand: {}", id, demand_str)))?;

        let allowed_mutations = self.load_mutation_overrides(id).await?;
        let allowed_traits = self.load_trait_overrides(id).await?;

        Ok(Some(CatalogItem {
            id: id.clone(),
            name,
            image,
            base_value,
            demand,
            allowed_mutations,
            allowed_traits,
        }))
    }

    async fn get_mutations(&self) -> Result<Vec<Mutation>, CatalogError> {
        let rows = sqlx::query("SELECT id, name, multiplier FROM mutations ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                let name: String = row.get("name");
                let multiplier = parse_multiplier(row.get("multiplier"), "mutation", &id)?;
                Ok(Mutation {
                    id: MutationId::new(id),
                    name,
                    multiplier,
                })
            })
            .collect()
    }

    async fn get_traits(&self) -> Result<Vec<TraitDef>, CatalogError> {
        let rows = sqlx::query("SELECT id, name, multiplier FROM traits ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                let name: String = row.get("name");
                let multiplier = parse_multiplier(row.get("multiplier"), "trait", &id)?;
                Ok(TraitDef {
                    id: TraitId::new(id),
                    name,
                    multiplier,
                })
            })
            .collect()
    }
}

impl SqliteCatalog {
    async fn load_mutation_overrides(
        &self,
        item: &ItemId,
    ) -> Result<BTreeMap<MutationId, MutationOverride>, CatalogError> {
        let rows = sqlx::query(
            r#"
            SELECT mutation_id, multiplier_override, image_override
            FROM item_mutations
            WHERE item_id = ?
            ORDER BY mutation_id ASC
            "#,
        )
        .bind(item.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut allowed = BTreeMap::new();
        for row in rows {
            let mutation_id: String = row.get("mutation_id");
            let multiplier = row
                .get::<Option<String>, _>("multiplier_override")
                .map(|s| parse_multiplier(s, "item_mutation override", &mutation_id))
                .transpose()?;
            let image: Option<String> = row.get("image_override");
            allowed.insert(
                MutationId::new(mutation_id),
                MutationOverride { multiplier, image },
            );
        }
        Ok(allowed)
    }

    async fn load_trait_overrides(
        &self,
        item: &ItemId,
    ) -> Result<BTreeMap<TraitId, TraitOverride>, CatalogError> {
        let rows = sqlx::query(
            r#"
            SELECT trait_id, multiplier_override
            FROM item_traits
            WHERE item_id = ?
            ORDER BY trait_id ASC
            "#,
        )
        .bind(item.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut allowed = BTreeMap::new();
        for row in rows {
            let trait_id: String = row.get("trait_id");
            let multiplier = row
                .get::<Option<String>, _>("multiplier_override")
                .map(|s| parse_multiplier(s, "item_trait override", &trait_id))
                .transpose()?;
            allowed.insert(TraitId::new(trait_id), TraitOverride { multiplier });
        }
        Ok(allowed)
    }
}

fn parse_multiplier(raw: String, kind: &str, id: &str) -> Result<Multiplier, CatalogError> {
    let multiplier = Multiplier::from_str_canonical(&raw)
        .map_err(|e| CatalogError::Corrupt(format!("{} {} multiplier: {}", kind, id, e)))?;
    if !multiplier.is_positive() {
        return Err(CatalogError::Corrupt(format!(
            "{} {} multiplier must be positive, got {}",
            kind, id, raw
        )));
    }
    Ok(multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use tempfile::TempDir;

    async fn setup_catalog() -> (SqliteCatalog, SqlitePool, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (SqliteCatalog::new(pool.clone()), pool, temp_dir)
    }

    async fn seed_item(pool: &SqlitePool, id: &str, base_value: &str) {
        sqlx::query(
            "INSERT INTO catalog_items (id, name, image, base_value, demand) VALUES (?, ?, ?, ?, 'high')",
        )
        .bind(id)
        .bind(id)
        .bind(format!("{}.png", id))
        .bind(base_value)
        .execute(pool)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_missing_item_is_none() {
        let (catalog, _pool, _temp) = setup_catalog().await;
        let item = catalog.get_item(&ItemId::new("ghost")).await.unwrap();
        assert!(item.is_none());
    }

    #[tokio::test]
    async fn test_item_with_overrides() {
        let (catalog, pool, _temp) = setup_catalog().await;
        seed_item(&pool, "dragon", "100").await;
        sqlx::query("INSERT INTO mutations (id, name, multiplier) VALUES ('shiny', 'Shiny', '2')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO item_mutations (item_id, mutation_id, multiplier_override, image_override) \
             VALUES ('dragon', 'shiny', '3', 'dragon_shiny.png')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let item = catalog
            .get_item(&ItemId::new("dragon"))
            .await
            .unwrap()
            .unwrap();
        let over = item.allowed_mutations.get(&MutationId::new("shiny")).unwrap();
        assert_eq!(
            over.multiplier.unwrap().to_canonical_string(),
            "3"
        );
        assert_eq!(over.image.as_deref(), Some("dragon_shiny.png"));
    }

    #[tokio::test]
    async fn test_non_positive_override_is_corrupt() {
        let (catalog, pool, _temp) = setup_catalog().await;
        seed_item(&pool, "dragon", "100").await;
        sqlx::query("INSERT INTO mutations (id, name, multiplier) VALUES ('shiny', 'Shiny', '2')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO item_mutations (item_id, mutation_id, multiplier_override) \
             VALUES ('dragon', 'shiny', '0')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let result = catalog.get_item(&ItemId::new("dragon")).await;
        assert!(matches!(result, Err(CatalogError::Corrupt(_))));
    }
}
