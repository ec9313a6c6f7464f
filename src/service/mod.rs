pub mod comparison;
pub mod products;
pub mod supermarkets;
