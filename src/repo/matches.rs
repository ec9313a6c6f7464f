use chrono::{DateTime, Utc};
use sqlx::PgPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MatchRow {
    pub id: i64,
    pub source_product_id: i64,
    pub target_product_id: i64,
    pub similarity_score: f64,
    pub created_at: DateTime<Utc>,
}

pub async fn find_match(
    pool: &PgPool,
    source_id: i64,
    target_id: i64,
) -> Result<Option<MatchRow>, sqlx::Error> {
    sqlx::query_as::<_, MatchRow>(
        r#"
        SELECT id, source_product_id, target_product_id, similarity_score, created_at
        FROM shop.product_matches
        WHERE source_product_id = $1
          AND target_product_id = $2
        "#,
    )
    .bind(source_id)
    .bind(target_id)
    .fetch_optional(pool)
    .await
}

/// Insert a new edge. Returns `None` when the (source, target) pair already
/// exists — the unique index absorbs the conflict instead of erroring, so
/// concurrent runs stay race-free.
pub async fn insert_match(
    pool: &PgPool,
    source_id: i64,
    target_id: i64,
    similarity_score: f64,
) -> Result<Option<MatchRow>, sqlx::Error> {
    sqlx::query_as::<_, MatchRow>(
        r#"
        INSERT INTO shop.product_matches (source_product_id, target_product_id, similarity_score)
        VALUES ($1, $2, $3)
        ON CONFLICT (source_product_id, target_product_id) DO NOTHING
        RETURNING id, source_product_id, target_product_id, similarity_score, created_at
        "#,
    )
    .bind(source_id)
    .bind(target_id)
    .bind(similarity_score)
    .fetch_optional(pool)
    .await
}

/// Edges are inserted source -> target only; two-way lookups are served by
/// querying both columns.
pub async fn list_for_product(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<MatchRow>, sqlx::Error> {
    sqlx::query_as::<_, MatchRow>(
        r#"
        SELECT id, source_product_id, target_product_id, similarity_score, created_at
        FROM shop.product_matches
        WHERE source_product_id = $1
           OR target_product_id = $1
        ORDER BY similarity_score DESC, id
        "#,
    )
    .bind(product_id)
    .fetch_all(pool)
    .await
}
