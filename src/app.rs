use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::{routing::get, Router};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    api,
    collector::{self, chains},
    config::AppConfig,
    matching::price::PriceNormalizer,
    repo,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub price_normalizer: Arc<PriceNormalizer>,
}

pub async fn build_router(config: &AppConfig) -> anyhow::Result<Router> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.db.url)
        .await?;

    repo::migrations::ensure_schema(&pool).await?;

    let conversion_table = config
        .matching
        .conversion_table()
        .context("invalid unit conversion table")?;
    let price_normalizer = Arc::new(PriceNormalizer::new(conversion_table));

    let scrapers = chains::build_scrapers(&config.chains)?;
    collector::spawn(
        pool.clone(),
        config.collector.clone(),
        config.matching.clone(),
        scrapers,
    )?;

    let state = AppState {
        pool,
        price_normalizer,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let middleware = ServiceBuilder::new().layer(cors);

    let router = Router::new()
        .route("/healthz", get(api::health::health_check))
        .route("/products", get(api::products::list_products))
        .route("/products/:id", get(api::products::get_product))
        .route("/products/:id/matches", get(api::products::product_matches))
        .route(
            "/products/:id/comparison",
            get(api::products::product_comparison),
        )
        .route("/supermarkets", get(api::supermarkets::list_supermarkets))
        .layer(middleware)
        .with_state(state);

    Ok(router)
}
