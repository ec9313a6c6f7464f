pub mod matches;
pub mod migrations;
pub mod prices;
pub mod products;
pub mod supermarkets;
