use sqlx::{Executor, PgPool};

pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    tx.execute(
        r#"
        CREATE SCHEMA IF NOT EXISTS shop;
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS shop.supermarkets (
          id            BIGSERIAL PRIMARY KEY,
          chain_id      TEXT NOT NULL,
          name          TEXT NOT NULL,
          branch_id     TEXT NOT NULL DEFAULT '',
          branch_name   TEXT,
          address       TEXT,
          created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
          updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_supermarkets_chain_branch
          ON shop.supermarkets(chain_id, branch_id);
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS shop.products (
          id              BIGSERIAL PRIMARY KEY,
          name            TEXT NOT NULL,
          canonical_name  TEXT NOT NULL,
          size            DOUBLE PRECISION NOT NULL,
          unit            TEXT NOT NULL,
          created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
          updated_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_products_name_size_unit
          ON shop.products(name, size, unit);
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_products_canonical_name
          ON shop.products(canonical_name);
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS shop.prices (
          id                    BIGSERIAL PRIMARY KEY,
          product_id            BIGINT NOT NULL REFERENCES shop.products(id) ON DELETE CASCADE,
          supermarket_id        BIGINT NOT NULL REFERENCES shop.supermarkets(id) ON DELETE CASCADE,
          price                 DOUBLE PRECISION NOT NULL,
          original_price        DOUBLE PRECISION,
          discount_price        DOUBLE PRECISION,
          discount_description  TEXT,
          collected_at          TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_prices_product_collected
          ON shop.prices(product_id, collected_at DESC);
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE TABLE IF NOT EXISTS shop.product_matches (
          id                  BIGSERIAL PRIMARY KEY,
          source_product_id   BIGINT NOT NULL REFERENCES shop.products(id) ON DELETE CASCADE,
          target_product_id   BIGINT NOT NULL REFERENCES shop.products(id) ON DELETE CASCADE,
          similarity_score    DOUBLE PRECISION NOT NULL,
          created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW(),
          updated_at          TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .await?;

    // Duplicate guard for the engine's check-then-insert sequence; two
    // concurrent runs cannot both create the same edge.
    tx.execute(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_product_matches_pair
          ON shop.product_matches(source_product_id, target_product_id);
        "#,
    )
    .await?;

    tx.execute(
        r#"
        CREATE INDEX IF NOT EXISTS idx_product_matches_target
          ON shop.product_matches(target_product_id);
        "#,
    )
    .await?;

    tx.commit().await?;
    Ok(())
}
