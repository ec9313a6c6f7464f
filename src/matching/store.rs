use anyhow::Result;
use sqlx::PgPool;

use crate::repo;

use super::engine::{CatalogProduct, MatchEdge, MatchStore, MatchStoreError, NewMatchEdge};

/// Postgres-backed store for the match engine. The unique index on
/// (source_product_id, target_product_id) makes `insert_match` race-free
/// under concurrent runs.
#[derive(Debug, Clone)]
pub struct PgMatchStore {
    pool: PgPool,
}

impl PgMatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl From<repo::matches::MatchRow> for MatchEdge {
    fn from(row: repo::matches::MatchRow) -> Self {
        MatchEdge {
            id: row.id,
            source_product_id: row.source_product_id,
            target_product_id: row.target_product_id,
            similarity_score: row.similarity_score,
            created_at: row.created_at,
        }
    }
}

impl MatchStore for PgMatchStore {
    async fn list_all_products(&self) -> Result<Vec<CatalogProduct>> {
        let rows = repo::products::list_catalog(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| CatalogProduct {
                id: row.id,
                canonical_name: row.canonical_name,
            })
            .collect())
    }

    async fn find_match(&self, source_id: i64, target_id: i64) -> Result<Option<MatchEdge>> {
        let row = repo::matches::find_match(&self.pool, source_id, target_id).await?;
        Ok(row.map(MatchEdge::from))
    }

    async fn insert_match(&self, edge: NewMatchEdge) -> Result<MatchEdge, MatchStoreError> {
        let inserted = repo::matches::insert_match(
            &self.pool,
            edge.source_product_id,
            edge.target_product_id,
            edge.similarity_score,
        )
        .await
        .map_err(|err| MatchStoreError::Store(err.into()))?;

        match inserted {
            Some(row) => Ok(row.into()),
            None => Err(MatchStoreError::DuplicateMatch),
        }
    }
}
