pub mod engine;
pub mod normalize;
pub mod price;
pub mod similarity;
pub mod store;
pub mod units;
