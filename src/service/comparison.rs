use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    matching::price::PriceNormalizer,
    model::{ComparisonOut, ComparisonRowOut, UnitPriceOut},
    repo,
};

use super::products::product_out;

/// Cross-retailer comparison for one product: its own latest prices plus
/// those of every matched peer, each normalized to the price per reference
/// unit. Rows whose price cannot be normalized carry a skip reason instead of
/// a number — never a silently wrong value.
pub async fn compare(
    pool: &PgPool,
    normalizer: &PriceNormalizer,
    product_id: i64,
) -> AppResult<ComparisonOut> {
    let product = repo::products::get_product(pool, product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {product_id}")))?;

    let edges = repo::matches::list_for_product(pool, product_id).await?;

    // The product itself, then its peers in edge order.
    let mut members: Vec<(i64, Option<f64>)> = vec![(product.id, None)];
    for edge in &edges {
        let peer_id = if edge.source_product_id == product_id {
            edge.target_product_id
        } else {
            edge.source_product_id
        };
        if members.iter().all(|(id, _)| *id != peer_id) {
            members.push((peer_id, Some(edge.similarity_score)));
        }
    }

    let mut rows = Vec::new();
    for (member_id, similarity_score) in members {
        let Some(member) = repo::products::get_product(pool, member_id).await? else {
            continue;
        };

        for price in repo::prices::latest_prices_for_product(pool, member_id).await? {
            let effective = price.discount_price.unwrap_or(price.price);
            let (unit_price, skip_reason) =
                match normalizer.per_reference_unit_raw(effective, member.size, &member.unit) {
                    Ok(unit_price) => (
                        Some(UnitPriceOut {
                            value: unit_price.value,
                            reference_unit: unit_price.reference.as_str().to_string(),
                        }),
                        None,
                    ),
                    Err(err) => (None, Some(err.to_string())),
                };

            rows.push(ComparisonRowOut {
                product_id: member.id,
                product_name: member.name.clone(),
                similarity_score,
                chain_id: price.chain_id,
                supermarket_name: price.supermarket_name,
                branch_name: price.branch_name,
                price: price.price,
                discount_price: price.discount_price,
                unit_price,
                skip_reason,
                collected_at: price.collected_at.to_rfc3339(),
            });
        }
    }

    // Cheapest per reference unit first; unnormalizable rows sink to the end.
    rows.sort_by(|a, b| match (&a.unit_price, &b.unit_price) {
        (Some(a), Some(b)) => a.value.total_cmp(&b.value),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    Ok(ComparisonOut {
        product: product_out(product),
        rows,
    })
}
