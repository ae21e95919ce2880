// In-memory repository shared by service and handler tests
use crate::application::market_data_repository::MarketDataRepository;
use crate::domain::curves::CurvePoint;
use crate::domain::market::Market;
use crate::domain::prices::HourlyPrice;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default, Clone)]
pub struct InMemoryRepository {
    prices: HashMap<(Market, String), Vec<HourlyPrice>>,
    curves: Vec<CurvePoint>,
    failing: HashSet<String>,
}

impl InMemoryRepository {
    pub fn add_prices(&mut self, market: Market, location: &str, rows: Vec<HourlyPrice>) {
        self.prices
            .entry((market, location.to_string()))
            .or_default()
            .extend(rows);
    }

    pub fn add_curve(&mut self, point: CurvePoint) {
        self.curves.push(point);
    }

    pub fn fail_location(&mut self, location: &str) {
        self.failing.insert(location.to_string());
    }
}

#[async_trait]
impl MarketDataRepository for InMemoryRepository {
    fn source_name(&self) -> &'static str {
        "memory"
    }

    async fn hourly_prices(
        &self,
        market: Market,
        location: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<HourlyPrice>> {
        if self.failing.contains(location) {
            anyhow::bail!("simulated failure for {}", location);
        }
        Ok(self
            .prices
            .get(&(market, location.to_string()))
            .map(|rows| {
                rows.iter()
                    .filter(|r| r.market_date >= start && r.market_date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn curve_points(&self, market: Option<Market>) -> anyhow::Result<Vec<CurvePoint>> {
        Ok(self
            .curves
            .iter()
            .filter(|p| market.is_none_or(|m| p.market == m))
            .cloned()
            .collect())
    }
}

/// 24 hourly rows: hours ending 1-12 at `low`, 13-24 at `high`.
pub fn full_day(date: NaiveDate, low: f64, high: f64) -> Vec<HourlyPrice> {
    (1..=24u8)
        .map(|he| HourlyPrice::new(date, he, if he <= 12 { low } else { high }))
        .collect()
}
