// Application layer - Use cases over the market data repository
pub mod catalog;
pub mod map_service;
pub mod market_data_repository;
pub mod performance_service;

#[cfg(test)]
pub mod test_support;
