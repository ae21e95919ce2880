// Repository trait for market price and curve data access
use crate::domain::curves::CurvePoint;
use crate::domain::market::Market;
use crate::domain::prices::HourlyPrice;
use async_trait::async_trait;
use chrono::NaiveDate;

#[async_trait]
pub trait MarketDataRepository: Send + Sync {
    /// Short label reported as the data source in API metadata
    fn source_name(&self) -> &'static str;

    /// Hourly prices for one location with market dates in `[start, end]`
    async fn hourly_prices(
        &self,
        market: Market,
        location: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<HourlyPrice>>;

    /// Monthly forecast revenue curve values, optionally restricted to one market
    async fn curve_points(&self, market: Option<Market>) -> anyhow::Result<Vec<CurvePoint>>;
}
