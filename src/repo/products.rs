use chrono::{DateTime, Utc};
use sqlx::PgPool;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub canonical_name: String,
    pub size: f64,
    pub unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct CatalogRow {
    pub id: i64,
    pub canonical_name: String,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub canonical_name: String,
    pub size: f64,
    pub unit: String,
}

pub struct ProductListArgs {
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

/// Create the product on first observation; a re-observation of the same
/// (name, size, unit) only touches `updated_at`.
pub async fn upsert_product(pool: &PgPool, product: NewProduct) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO shop.products (name, canonical_name, size, unit)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (name, size, unit) DO UPDATE SET
            canonical_name = EXCLUDED.canonical_name,
            updated_at = NOW()
        RETURNING id
        "#,
    )
    .bind(product.name)
    .bind(product.canonical_name)
    .bind(product.size)
    .bind(product.unit)
    .fetch_one(pool)
    .await
}

/// The catalog snapshot a match run scans, in insertion order.
pub async fn list_catalog(pool: &PgPool) -> Result<Vec<CatalogRow>, sqlx::Error> {
    sqlx::query_as::<_, CatalogRow>(
        r#"
        SELECT id, canonical_name
        FROM shop.products
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn get_product(pool: &PgPool, id: i64) -> Result<Option<ProductRow>, sqlx::Error> {
    sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT id, name, canonical_name, size, unit, created_at, updated_at
        FROM shop.products
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_products(
    pool: &PgPool,
    args: ProductListArgs,
) -> Result<(Vec<ProductRow>, i64), sqlx::Error> {
    let rows = sqlx::query_as::<_, ProductRow>(
        r#"
        SELECT id, name, canonical_name, size, unit, created_at, updated_at
        FROM shop.products
        WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%'
               OR canonical_name ILIKE '%' || $1 || '%')
        ORDER BY id
        LIMIT $2
        OFFSET $3
        "#,
    )
    .bind(args.search.as_deref())
    .bind(args.limit)
    .bind(args.offset)
    .fetch_all(pool)
    .await?;

    let total = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM shop.products
        WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%'
               OR canonical_name ILIKE '%' || $1 || '%')
        "#,
    )
    .bind(args.search.as_deref())
    .fetch_one(pool)
    .await?;

    Ok((rows, total))
}
