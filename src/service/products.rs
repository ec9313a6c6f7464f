use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    model::{
        LatestPriceOut, MatchOut, PageResp, ProductListQuery, ProductOut, ProductWithPricesOut,
    },
    repo,
};

pub fn product_out(row: repo::products::ProductRow) -> ProductOut {
    ProductOut {
        id: row.id,
        name: row.name,
        canonical_name: row.canonical_name,
        size: row.size,
        unit: row.unit,
        created_at: row.created_at.to_rfc3339(),
        updated_at: row.updated_at.to_rfc3339(),
    }
}

async fn latest_prices_out(pool: &PgPool, product_id: i64) -> AppResult<Vec<LatestPriceOut>> {
    let rows = repo::prices::latest_prices_for_product(pool, product_id).await?;
    Ok(rows
        .into_iter()
        .map(|row| LatestPriceOut {
            supermarket_id: row.supermarket_id,
            chain_id: row.chain_id,
            supermarket_name: row.supermarket_name,
            branch_name: row.branch_name,
            price: row.price,
            discount_price: row.discount_price,
            discount_description: row.discount_description,
            collected_at: row.collected_at.to_rfc3339(),
        })
        .collect())
}

pub async fn list(
    pool: &PgPool,
    query: ProductListQuery,
) -> AppResult<PageResp<ProductWithPricesOut>> {
    let ProductListQuery {
        search,
        page,
        page_size,
    } = query;

    let page = if page == 0 { 1 } else { page };
    let page_size = page_size.clamp(1, 100);
    let offset = ((page - 1) * page_size) as i64;
    let limit = page_size as i64;

    let search = search.filter(|s| !s.trim().is_empty());

    let (rows, total) = repo::products::list_products(
        pool,
        repo::products::ProductListArgs {
            search,
            limit,
            offset,
        },
    )
    .await?;

    tracing::debug!(page, page_size, total, "products list queried");

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let latest_prices = latest_prices_out(pool, row.id).await?;
        items.push(ProductWithPricesOut {
            product: product_out(row),
            latest_prices,
        });
    }

    Ok(PageResp {
        page,
        page_size,
        total_hint: total.max(0) as u64,
        items,
    })
}

pub async fn get(pool: &PgPool, id: i64) -> AppResult<ProductWithPricesOut> {
    let row = repo::products::get_product(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    let latest_prices = latest_prices_out(pool, row.id).await?;
    Ok(ProductWithPricesOut {
        product: product_out(row),
        latest_prices,
    })
}

/// All match edges touching the product, regardless of direction.
pub async fn matches(pool: &PgPool, id: i64) -> AppResult<Vec<MatchOut>> {
    if repo::products::get_product(pool, id).await?.is_none() {
        return Err(AppError::NotFound(format!("product {id}")));
    }

    let rows = repo::matches::list_for_product(pool, id).await?;
    Ok(rows
        .into_iter()
        .map(|row| MatchOut {
            id: row.id,
            source_product_id: row.source_product_id,
            target_product_id: row.target_product_id,
            similarity_score: row.similarity_score,
            created_at: row.created_at.to_rfc3339(),
        })
        .collect())
}
