// Application state for HTTP handlers
use crate::application::map_service::MapService;
use crate::application::performance_service::MarketPerformanceService;
use crate::domain::proxy_route::{AssetOrigins, ProxyRoute};
use crate::infrastructure::upstream_proxy::UpstreamProxy;
use chrono::{NaiveDate, Utc};

#[derive(Clone)]
pub struct AppState {
    pub performance_service: MarketPerformanceService,
    pub map_service: MapService,
    pub proxy: UpstreamProxy,
    pub proxy_routes: Vec<ProxyRoute>,
    pub asset_origins: AssetOrigins,
    /// Pinned evaluation date; today (UTC) when unset.
    pub as_of: Option<NaiveDate>,
}

impl AppState {
    pub fn as_of(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Utc::now().date_naive())
    }
}
