use chrono::{DateTime, Utc};
use sqlx::PgPool;

#[derive(Debug, Clone)]
pub struct NewPrice {
    pub product_id: i64,
    pub supermarket_id: i64,
    pub price: f64,
    pub original_price: Option<f64>,
    pub discount_price: Option<f64>,
    pub discount_description: Option<String>,
}

/// Latest observation per retailer for one product, joined with the
/// retailer's identity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LatestPriceRow {
    pub product_id: i64,
    pub supermarket_id: i64,
    pub chain_id: String,
    pub supermarket_name: String,
    pub branch_name: Option<String>,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub discount_description: Option<String>,
    pub collected_at: DateTime<Utc>,
}

/// Prices are an append-only time series: a fresh observation is always a new
/// row, never an update.
pub async fn insert_price(pool: &PgPool, price: NewPrice) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO shop.prices (
            product_id,
            supermarket_id,
            price,
            original_price,
            discount_price,
            discount_description
        )
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(price.product_id)
    .bind(price.supermarket_id)
    .bind(price.price)
    .bind(price.original_price)
    .bind(price.discount_price)
    .bind(price.discount_description)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn latest_prices_for_product(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<LatestPriceRow>, sqlx::Error> {
    sqlx::query_as::<_, LatestPriceRow>(
        r#"
        SELECT DISTINCT ON (p.supermarket_id)
               p.product_id,
               p.supermarket_id,
               s.chain_id,
               s.name AS supermarket_name,
               s.branch_name,
               p.price,
               p.discount_price,
               p.discount_description,
               p.collected_at
        FROM shop.prices p
        JOIN shop.supermarkets s ON s.id = p.supermarket_id
        WHERE p.product_id = $1
        ORDER BY p.supermarket_id, p.collected_at DESC
        "#,
    )
    .bind(product_id)
    .fetch_all(pool)
    .await
}
