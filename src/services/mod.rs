pub mod products;
pub mod stock;
