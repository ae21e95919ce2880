// CSV-backed implementation of MarketDataRepository
use crate::application::market_data_repository::MarketDataRepository;
use crate::domain::curves::{CurvePoint, CurveSource};
use crate::domain::market::Market;
use crate::domain::prices::HourlyPrice;
use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const PRICES_FILE: &str = "prices.csv";
pub const CURVES_FILE: &str = "curves.csv";

#[derive(Debug, Deserialize)]
struct PriceRow {
    market: String,
    location: String,
    date: NaiveDate,
    hour_ending: u8,
    price: f64,
}

/// Columns needed to decide whether a price row belongs to a query.
#[derive(Debug, Deserialize)]
struct RowKey {
    market: String,
    location: String,
}

#[derive(Debug, Deserialize)]
struct CurveRow {
    location: String,
    market: String,
    battery_duration: f64,
    created_by: String,
    timestamp: NaiveDate,
    value: f64,
}

/// Reads `prices.csv` and `curves.csv` from a data directory on every query.
pub struct CsvRepository {
    data_dir: PathBuf,
}

impl CsvRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    async fn read_file(&self, name: &str) -> anyhow::Result<String> {
        let path = self.data_dir.join(name);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }
}

fn parse_prices(
    content: &str,
    market: Market,
    location: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> anyhow::Result<Vec<HourlyPrice>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());
    let headers = rdr.headers().context("Missing price header row")?.clone();
    let mut prices = Vec::new();

    // Rows for other locations are never fully parsed, so their errors stay theirs.
    for (line, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Unreadable price row {}", line + 2))?;
        let key: RowKey = match record.deserialize(Some(&headers)) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!("Skipping price row {}: {}", line + 2, e);
                continue;
            }
        };
        if !key.location.eq_ignore_ascii_case(location) {
            continue;
        }
        match key.market.parse::<Market>() {
            Ok(m) if m == market => {}
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!("Skipping price row {}: {}", line + 2, e);
                continue;
            }
        }
        let row: PriceRow = record
            .deserialize(Some(&headers))
            .with_context(|| format!("Invalid price row {}", line + 2))?;
        if row.date < start || row.date > end {
            continue;
        }
        prices.push(HourlyPrice::new(row.date, row.hour_ending, row.price));
    }

    prices.sort_by_key(|p| (p.market_date, p.hour_ending));
    Ok(prices)
}

fn parse_curves(content: &str, market: Option<Market>) -> anyhow::Result<Vec<CurvePoint>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut points = Vec::new();

    for (line, result) in rdr.deserialize::<CurveRow>().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("Skipping curve row {}: {}", line + 2, e);
                continue;
            }
        };
        let row_market = match row.market.parse::<Market>() {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Skipping curve row {}: {}", line + 2, e);
                continue;
            }
        };
        if market.is_some_and(|m| m != row_market) {
            continue;
        }
        points.push(CurvePoint {
            location: row.location,
            market: row_market,
            battery_duration: row.battery_duration,
            source: CurveSource::from_creator(&row.created_by),
            timestamp: row.timestamp,
            value: row.value,
        });
    }

    Ok(points)
}

#[async_trait]
impl MarketDataRepository for CsvRepository {
    fn source_name(&self) -> &'static str {
        "csv"
    }

    async fn hourly_prices(
        &self,
        market: Market,
        location: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> anyhow::Result<Vec<HourlyPrice>> {
        let content = self.read_file(PRICES_FILE).await?;
        let prices = parse_prices(&content, market, location, start, end)?;
        tracing::debug!(
            "Loaded {} hourly prices for {} {} ({} to {})",
            prices.len(),
            market,
            location,
            start,
            end
        );
        Ok(prices)
    }

    async fn curve_points(&self, market: Option<Market>) -> anyhow::Result<Vec<CurvePoint>> {
        let content = self.read_file(CURVES_FILE).await?;
        let points = parse_curves(&content, market)?;
        tracing::debug!("Loaded {} curve points", points.len());
        Ok(points)
    }
}

pub fn data_dir_exists(dir: &Path) -> bool {
    dir.join(PRICES_FILE).is_file() || dir.join(CURVES_FILE).is_file()
}
