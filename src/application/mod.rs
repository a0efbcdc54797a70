pub mod order_service;
pub mod stock_service;
