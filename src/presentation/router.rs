// Route table for the API, mounted sub-sites and shared assets
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{health_check, map_curves, map_locations, market_performance};
use crate::presentation::proxy_handlers::{asset_proxy, proxy_mounted};
use axum::{
    extract::{Request, State},
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    // Proxied responses keep their upstream encoding; only the JSON API is compressed here.
    let api = Router::new()
        .route("/api/market-performance", get(market_performance))
        .route("/api/map-locations", get(map_locations))
        .route("/api/map-curves", get(map_curves))
        .layer(CompressionLayer::new());

    let mut router = Router::new()
        .route("/healthz", get(health_check))
        .merge(api)
        .route("/_astro/*path", any(asset_proxy))
        .route("/assets/*path", any(asset_proxy));

    for route in &state.proxy_routes {
        let handler = {
            let route = route.clone();
            move |State(state): State<Arc<AppState>>, request: Request| {
                proxy_mounted(state, route.clone(), request)
            }
        };
        tracing::info!("Mounting {} -> {}", route.prefix, route.origin);
        // `/*rest` does not match an empty tail, so the trailing-slash root needs its own route.
        router = router
            .route(&route.prefix, any(handler.clone()))
            .route(&format!("{}/", route.prefix), any(handler.clone()))
            .route(&format!("{}/*rest", route.prefix), any(handler));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
