use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ProductOut {
    pub id: i64,
    pub name: String,
    pub canonical_name: String,
    pub size: f64,
    pub unit: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Latest observed price at one retailer.
#[derive(Debug, Serialize)]
pub struct LatestPriceOut {
    pub supermarket_id: i64,
    pub chain_id: String,
    pub supermarket_name: String,
    pub branch_name: Option<String>,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub discount_description: Option<String>,
    pub collected_at: String,
}

#[derive(Debug, Serialize)]
pub struct ProductWithPricesOut {
    #[serde(flatten)]
    pub product: ProductOut,
    pub latest_prices: Vec<LatestPriceOut>,
}

#[derive(Debug, Serialize)]
pub struct SupermarketOut {
    pub id: i64,
    pub chain_id: String,
    pub name: String,
    pub branch_id: String,
    pub branch_name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MatchOut {
    pub id: i64,
    pub source_product_id: i64,
    pub target_product_id: i64,
    pub similarity_score: f64,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct UnitPriceOut {
    pub value: f64,
    pub reference_unit: String,
}

/// One (product, retailer) cell of a price comparison. `unit_price` is absent
/// when the price could not be normalized; `skip_reason` says why.
#[derive(Debug, Serialize)]
pub struct ComparisonRowOut {
    pub product_id: i64,
    pub product_name: String,
    pub similarity_score: Option<f64>,
    pub chain_id: String,
    pub supermarket_name: String,
    pub branch_name: Option<String>,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub unit_price: Option<UnitPriceOut>,
    pub skip_reason: Option<String>,
    pub collected_at: String,
}

#[derive(Debug, Serialize)]
pub struct ComparisonOut {
    pub product: ProductOut,
    pub rows: Vec<ComparisonRowOut>,
}

#[derive(Debug, Serialize)]
pub struct PageResp<T> {
    pub page: u32,
    pub page_size: u32,
    pub total_hint: u64,
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl Default for ProductListQuery {
    fn default() -> Self {
        Self {
            search: None,
            page: 1,
            page_size: 20,
        }
    }
}
