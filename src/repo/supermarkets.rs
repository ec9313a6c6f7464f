use chrono::{DateTime, Utc};
use sqlx::PgPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SupermarketRow {
    pub id: i64,
    pub chain_id: String,
    pub name: String,
    pub branch_id: String,
    pub branch_name: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SupermarketUpsert {
    pub chain_id: String,
    pub name: String,
    pub branch_id: String,
    pub branch_name: Option<String>,
    pub address: Option<String>,
}

pub async fn upsert_supermarket(
    pool: &PgPool,
    record: SupermarketUpsert,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO shop.supermarkets (chain_id, name, branch_id, branch_name, address)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (chain_id, branch_id) DO UPDATE SET
            name = EXCLUDED.name,
            branch_name = COALESCE(EXCLUDED.branch_name, shop.supermarkets.branch_name),
            address = COALESCE(EXCLUDED.address, shop.supermarkets.address),
            updated_at = NOW()
        RETURNING id
        "#,
    )
    .bind(record.chain_id)
    .bind(record.name)
    .bind(record.branch_id)
    .bind(record.branch_name)
    .bind(record.address)
    .fetch_one(pool)
    .await
}

pub async fn list_supermarkets(pool: &PgPool) -> Result<Vec<SupermarketRow>, sqlx::Error> {
    sqlx::query_as::<_, SupermarketRow>(
        r#"
        SELECT id, chain_id, name, branch_id, branch_name, address, created_at, updated_at
        FROM shop.supermarkets
        ORDER BY chain_id, branch_id
        "#,
    )
    .fetch_all(pool)
    .await
}
