use axum::{extract::State, Json};

use crate::{app::AppState, error::AppResult, model::SupermarketOut, service};

pub async fn list_supermarkets(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<SupermarketOut>>> {
    let supermarkets = service::supermarkets::list(&state.pool).await?;
    Ok(Json(supermarkets))
}
