// Domain layer - Pure market analytics and routing rules
pub mod curves;
pub mod error;
pub mod location;
pub mod market;
pub mod performance;
pub mod prices;
pub mod proxy_route;
pub mod revenue;
pub mod rewrite;
pub mod spread;
