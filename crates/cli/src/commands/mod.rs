pub mod cart;
pub mod migrate;
