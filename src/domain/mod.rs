pub mod catalog;
pub mod errors;
pub mod order;
pub mod pricing;
pub mod status;
pub mod stock;
