use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    app::AppState,
    error::AppResult,
    model::{ComparisonOut, MatchOut, PageResp, ProductListQuery, ProductWithPricesOut},
    service,
};

pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> AppResult<Json<PageResp<ProductWithPricesOut>>> {
    let resp = service::products::list(&state.pool, query).await?;
    Ok(Json(resp))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ProductWithPricesOut>> {
    let product = service::products::get(&state.pool, id).await?;
    Ok(Json(product))
}

pub async fn product_matches(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<MatchOut>>> {
    let matches = service::products::matches(&state.pool, id).await?;
    Ok(Json(matches))
}

pub async fn product_comparison(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ComparisonOut>> {
    let comparison =
        service::comparison::compare(&state.pool, &state.price_normalizer, id).await?;
    Ok(Json(comparison))
}
