use sqlx::PgPool;

use crate::{error::AppResult, model::SupermarketOut, repo};

pub async fn list(pool: &PgPool) -> AppResult<Vec<SupermarketOut>> {
    let rows = repo::supermarkets::list_supermarkets(pool).await?;
    Ok(rows
        .into_iter()
        .map(|row| SupermarketOut {
            id: row.id,
            chain_id: row.chain_id,
            name: row.name,
            branch_id: row.branch_id,
            branch_name: row.branch_name,
            address: row.address,
        })
        .collect())
}
