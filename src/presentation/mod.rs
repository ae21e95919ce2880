// Presentation layer - HTTP routing and handlers
pub mod app_state;
pub mod handlers;
pub mod proxy_handlers;
pub mod router;
