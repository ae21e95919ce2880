// Market performance service - Use case for per-location YTD performance
use crate::application::catalog::{CatalogEntry, LocationCatalog};
use crate::application::market_data_repository::MarketDataRepository;
use crate::domain::market::{tb_label, Market};
use crate::domain::performance::{LocationPerformance, MarketSettings, PerformanceModel};
use crate::domain::prices::{assemble_days, DailyPriceObservation};
use crate::domain::revenue::{aggregate_ytd, year_start};
use chrono::{Datelike, NaiveDate, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketPerformance {
    pub market: Market,
    pub tb_type: String,
    pub locations: Vec<LocationPerformance>,
    pub last_updated: String,
    pub metadata: PerformanceMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetadata {
    pub data_source: String,
    pub calculation_date: String,
    pub year: i32,
    pub as_of: NaiveDate,
    pub boy_model: String,
}

#[derive(Clone)]
pub struct MarketPerformanceService {
    repository: Arc<dyn MarketDataRepository>,
    catalog: Arc<LocationCatalog>,
    model: PerformanceModel,
}

impl MarketPerformanceService {
    pub fn new(
        repository: Arc<dyn MarketDataRepository>,
        catalog: Arc<LocationCatalog>,
        model: PerformanceModel,
    ) -> Self {
        Self {
            repository,
            catalog,
            model,
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.repository.source_name()
    }

    /// Performance records grouped by market. Each location is computed on its own;
    /// a failure for one location yields a "no data" record for it alone.
    pub async fn market_performance(
        &self,
        market: Option<Market>,
        location: Option<&str>,
        as_of: NaiveDate,
    ) -> Vec<MarketPerformance> {
        let calculated_at = Utc::now();
        let mut result = Vec::new();

        for mkt in Market::ALL {
            if market.is_some_and(|m| m != mkt) {
                continue;
            }
            let entries = self.catalog.select(Some(mkt), location);
            if entries.is_empty() {
                continue;
            }

            let settings = self.catalog.settings(mkt);
            let locations = join_all(
                entries
                    .into_iter()
                    .map(|entry| self.location_performance(entry, &settings, as_of)),
            )
            .await;

            let last_updated = locations
                .iter()
                .filter_map(|l| l.last_observation_date)
                .max()
                .map(|d| d.to_string())
                .unwrap_or_else(|| calculated_at.to_rfc3339());

            tracing::info!(
                "Built {} performance: {} locations, {} with data",
                mkt,
                locations.len(),
                locations.iter().filter(|l| l.has_data()).count()
            );

            result.push(MarketPerformance {
                market: mkt,
                tb_type: tb_label(settings.spread_hours),
                locations,
                last_updated,
                metadata: PerformanceMetadata {
                    data_source: self.repository.source_name().to_string(),
                    calculation_date: calculated_at.to_rfc3339(),
                    year: as_of.year(),
                    as_of,
                    boy_model: self.model.boy_strategy_name().to_string(),
                },
            });
        }

        result
    }

    async fn location_performance(
        &self,
        entry: &CatalogEntry,
        settings: &MarketSettings,
        as_of: NaiveDate,
    ) -> LocationPerformance {
        let location = &entry.location;

        let history = match self.load_days(entry, year_start(as_of), as_of).await {
            Ok(days) => days,
            Err(e) => {
                tracing::error!(
                    "Error fetching prices for {} {}: {:#}",
                    location.market,
                    location.name,
                    e
                );
                Vec::new()
            }
        };

        let prior_year = self.prior_year_ytd(entry, settings, as_of).await;

        self.model.build_location_performance(
            location,
            &history,
            entry.targets.as_ref(),
            settings,
            prior_year,
            as_of,
        )
    }

    /// YTD value for the same window one year earlier, if that year has data.
    async fn prior_year_ytd(
        &self,
        entry: &CatalogEntry,
        settings: &MarketSettings,
        as_of: NaiveDate,
    ) -> Option<f64> {
        let prior_as_of = same_day_prior_year(as_of)?;
        let days = match self.load_days(entry, year_start(prior_as_of), prior_as_of).await {
            Ok(days) => days,
            Err(e) => {
                tracing::warn!(
                    "Error fetching prior-year prices for {} {}: {:#}",
                    entry.location.market,
                    entry.location.name,
                    e
                );
                return None;
            }
        };
        let spreads =
            self.model
                .daily_spreads(&entry.location, &days, settings.spread_hours, prior_as_of);
        let prior = aggregate_ytd(&spreads, prior_as_of, &settings.conversion).ytd_average_tb;
        if prior.is_none() {
            tracing::debug!(
                "No prior-year data for {} {}",
                entry.location.market,
                entry.location.name
            );
        }
        prior
    }

    async fn load_days(
        &self,
        entry: &CatalogEntry,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<DailyPriceObservation>> {
        let location = &entry.location;
        let rows = self
            .repository
            .hourly_prices(location.market, &location.name, start, end)
            .await?;
        let (days, dropped) = assemble_days(&rows);
        if !dropped.is_empty() {
            tracing::debug!(
                "Dropped {} incomplete days for {} {}",
                dropped.len(),
                location.market,
                location.name
            );
        }
        Ok(days)
    }
}

/// `as_of` moved back one year; Feb 29 maps to Feb 28.
pub fn same_day_prior_year(as_of: NaiveDate) -> Option<NaiveDate> {
    let year = as_of.year() - 1;
    as_of
        .with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, 2, 28))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{full_day, InMemoryRepository};
    use crate::domain::location::Location;
    use crate::domain::performance::LocationTargets;
    use std::collections::HashMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn catalog() -> Arc<LocationCatalog> {
        Arc::new(LocationCatalog::new(
            vec![
                CatalogEntry {
                    location: Location::new("NP15", Market::Caiso),
                    targets: Some(LocationTargets {
                        year_ahead_forecast: Some(8.4),
                        ..Default::default()
                    }),
                },
                CatalogEntry {
                    location: Location::new("SP15", Market::Caiso),
                    targets: None,
                },
                CatalogEntry {
                    location: Location::new("Houston Hub", Market::Ercot),
                    targets: None,
                },
            ],
            HashMap::new(),
        ))
    }

    fn repository() -> InMemoryRepository {
        let mut repo = InMemoryRepository::default();
        for d in 1..=10 {
            repo.add_prices(Market::Caiso, "NP15", full_day(date(2025, 1, d), 20.0, 60.0));
            repo.add_prices(Market::Caiso, "NP15", full_day(date(2024, 1, d), 20.0, 40.0));
            repo.add_prices(Market::Ercot, "Houston Hub", full_day(date(2025, 1, d), 0.0, 100.0));
        }
        repo
    }

    #[tokio::test]
    async fn test_groups_by_market_and_isolates_missing_data() {
        let service = MarketPerformanceService::new(
            Arc::new(repository()),
            catalog(),
            PerformanceModel::default(),
        );
        let data = service
            .market_performance(None, None, date(2025, 1, 10))
            .await;

        assert_eq!(data.len(), 2);
        assert_eq!(data[0].market, Market::Caiso);
        assert_eq!(data[0].tb_type, "TB4");
        assert_eq!(data[0].locations.len(), 2);
        assert_eq!(data[0].last_updated, "2025-01-10");
        assert_eq!(data[1].tb_type, "TB2");

        let np15 = &data[0].locations[0];
        assert!(np15.has_data());
        assert_eq!(np15.ytd_days_count, 10);
        assert!(np15.yoy_comparison_available);
        assert_eq!(np15.yoy_change, "+100.0%");

        let sp15 = &data[0].locations[1];
        assert!(!sp15.has_data());
        assert!(!sp15.yoy_comparison_available);
    }

    #[tokio::test]
    async fn test_repository_failure_is_per_location() {
        let mut repo = repository();
        repo.fail_location("NP15");
        let service =
            MarketPerformanceService::new(Arc::new(repo), catalog(), PerformanceModel::default());

        let data = service
            .market_performance(Some(Market::Caiso), None, date(2025, 1, 10))
            .await;
        assert_eq!(data.len(), 1);
        assert!(!data[0].locations[0].has_data());
        assert!(!data[0].locations[1].has_data());

        let ercot = service
            .market_performance(Some(Market::Ercot), None, date(2025, 1, 10))
            .await;
        assert!(ercot[0].locations[0].has_data());
    }

    #[tokio::test]
    async fn test_location_filter() {
        let service = MarketPerformanceService::new(
            Arc::new(repository()),
            catalog(),
            PerformanceModel::default(),
        );
        let data = service
            .market_performance(None, Some("houston hub"), date(2025, 1, 10))
            .await;
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].market, Market::Ercot);
        assert_eq!(data[0].locations[0].location_id, "ercot_houston_hub");
    }

    #[test]
    fn test_same_day_prior_year() {
        assert_eq!(same_day_prior_year(date(2025, 3, 1)), Some(date(2024, 3, 1)));
        assert_eq!(same_day_prior_year(date(2024, 2, 29)), Some(date(2023, 2, 28)));
    }
}
