// Location performance record and its builder
use super::location::{Location, LocationType};
use super::market::Market;
use super::prices::DailyPriceObservation;
use super::revenue::{
    aggregate_ytd, estimate_percentile, needed_to_meet, p_label, project_annual_total, round2,
    year_start, DailySpread, RevenueConversion, YoyChange, DEFAULT_DAYS_IN_YEAR,
    DEFAULT_FORECAST_STD_DEV,
};
use super::spread::compute_peak_trough_spread;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Forecast and target configuration for one (market, location).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LocationTargets {
    /// Full-year forecast, $/kW-month.
    #[serde(default)]
    pub year_ahead_forecast: Option<f64>,
    #[serde(default)]
    pub target_p_value: Option<u8>,
    #[serde(default)]
    pub as_proportion: Option<f64>,
}

/// Per-market calculation constants.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSettings {
    pub market: Market,
    pub spread_hours: usize,
    pub as_proportion: f64,
    pub default_target_p_value: u8,
    pub forecast_std_dev: f64,
    pub conversion: RevenueConversion,
}

impl MarketSettings {
    pub fn defaults_for(market: Market) -> Self {
        let spread_hours = market.default_spread_hours();
        Self {
            market,
            spread_hours,
            as_proportion: market.default_as_proportion(),
            default_target_p_value: 50,
            forecast_std_dev: DEFAULT_FORECAST_STD_DEV,
            conversion: RevenueConversion::for_spread_hours(spread_hours),
        }
    }
}

/// Inputs available to a balance-of-year forecast.
#[derive(Debug, Clone, Copy)]
pub struct BoyContext {
    pub ytd_actual: f64,
    pub year_ahead_forecast: Option<f64>,
    pub day_of_year: u32,
    pub days_in_year: u32,
}

/// Balance-of-year forecast model, $/kW-month.
pub trait BalanceOfYearStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn forecast(&self, ctx: &BoyContext) -> f64;
}

/// Assumes the remainder of the year performs like the year so far.
///
/// Placeholder for a real forward curve model.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrendContinuation;

impl BalanceOfYearStrategy for TrendContinuation {
    fn name(&self) -> &'static str {
        "trend-continuation"
    }

    fn forecast(&self, ctx: &BoyContext) -> f64 {
        ctx.ytd_actual
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationPerformance {
    pub name: String,
    pub location_id: String,
    pub market: Market,
    pub location_type: LocationType,
    pub duration: String,

    #[serde(rename = "ytdTB4")]
    pub ytd_tb: Option<f64>,
    pub ytd_days_count: usize,
    pub ytd_forecast: Option<f64>,
    pub ytd_p_value: Option<String>,
    pub ytd_p_value_amount: Option<f64>,

    pub year_ahead_forecast: Option<f64>,
    pub forecast_configured: bool,

    pub boy_forecast: Option<f64>,
    pub boy_days_remaining: u32,
    pub boy_p_value: Option<String>,

    /// Average still required over the rest of the year to reach the year-ahead
    /// forecast. The legacy dashboard reported the forecast itself here.
    pub needed_to_meet: Option<f64>,
    pub needed_p_value: String,

    pub projected_total: Option<f64>,
    pub yoy_change: String,
    pub yoy_change_percent: Option<f64>,
    pub yoy_comparison_available: bool,

    pub as_proportion: f64,
    #[serde(rename = "totalWithAS")]
    pub total_with_as: Option<f64>,

    pub last_observation_date: Option<NaiveDate>,
}

impl LocationPerformance {
    pub fn has_data(&self) -> bool {
        self.ytd_tb.is_some()
    }
}

/// Builds [`LocationPerformance`] records from price history and configuration.
#[derive(Clone)]
pub struct PerformanceModel {
    days_in_year: u32,
    boy_strategy: Arc<dyn BalanceOfYearStrategy>,
}

impl Default for PerformanceModel {
    fn default() -> Self {
        Self::new(DEFAULT_DAYS_IN_YEAR)
    }
}

impl PerformanceModel {
    pub fn new(days_in_year: u32) -> Self {
        Self {
            days_in_year,
            boy_strategy: Arc::new(TrendContinuation),
        }
    }

    pub fn with_boy_strategy(mut self, strategy: Arc<dyn BalanceOfYearStrategy>) -> Self {
        self.boy_strategy = strategy;
        self
    }

    pub fn days_in_year(&self) -> u32 {
        self.days_in_year
    }

    pub fn boy_strategy_name(&self) -> &'static str {
        self.boy_strategy.name()
    }

    /// Days elapsed since Jan 1 (Jan 1 itself is day 0), capped at the modeled year length.
    pub fn day_of_year(&self, as_of: NaiveDate) -> u32 {
        as_of.ordinal0().min(self.days_in_year)
    }

    /// Daily spreads for the YTD window; malformed days are logged and skipped.
    pub fn daily_spreads(
        &self,
        location: &Location,
        price_history: &[DailyPriceObservation],
        spread_hours: usize,
        as_of: NaiveDate,
    ) -> Vec<DailySpread> {
        let start = year_start(as_of);
        price_history
            .iter()
            .filter(|obs| obs.market_date >= start && obs.market_date <= as_of)
            .filter_map(|obs| {
                match compute_peak_trough_spread(&obs.hourly_prices, spread_hours) {
                    Ok(calc) => Some(DailySpread::new(obs.market_date, calc.tb_value)),
                    Err(e) => {
                        tracing::warn!(
                            "Skipping {} {} on {}: {}",
                            location.market,
                            location.name,
                            obs.market_date,
                            e
                        );
                        None
                    }
                }
            })
            .collect()
    }

    pub fn build_location_performance(
        &self,
        location: &Location,
        price_history: &[DailyPriceObservation],
        targets: Option<&LocationTargets>,
        settings: &MarketSettings,
        prior_year_ytd: Option<f64>,
        as_of: NaiveDate,
    ) -> LocationPerformance {
        let day_of_year = self.day_of_year(as_of);
        let days_remaining = self.days_in_year.saturating_sub(day_of_year);
        let default_targets = LocationTargets::default();
        let targets = targets.unwrap_or(&default_targets);

        let target_p = targets
            .target_p_value
            .unwrap_or(settings.default_target_p_value);
        let as_proportion = targets.as_proportion.unwrap_or(settings.as_proportion);
        let forecast_configured = targets.year_ahead_forecast.is_some();

        let spreads = self.daily_spreads(location, price_history, settings.spread_hours, as_of);
        let last_observation_date = spreads.iter().map(|s| s.date).max();
        let aggregate = aggregate_ytd(&spreads, as_of, &settings.conversion);

        let mut record = LocationPerformance {
            name: location.display_name().to_string(),
            location_id: location.location_id(),
            market: location.market,
            location_type: location.location_type,
            duration: location.standard_duration.clone(),
            ytd_tb: None,
            ytd_days_count: aggregate.ytd_days_count,
            ytd_forecast: None,
            ytd_p_value: None,
            ytd_p_value_amount: None,
            year_ahead_forecast: targets.year_ahead_forecast.map(round2),
            forecast_configured,
            boy_forecast: None,
            boy_days_remaining: days_remaining,
            boy_p_value: None,
            needed_to_meet: None,
            needed_p_value: p_label(target_p),
            projected_total: None,
            yoy_change: YoyChange::unavailable().label(),
            yoy_change_percent: None,
            yoy_comparison_available: false,
            as_proportion,
            total_with_as: None,
            last_observation_date,
        };

        let Some(ytd) = aggregate.ytd_average_tb else {
            tracing::debug!(
                "No YTD data for {} {} as of {}",
                location.market,
                location.name,
                as_of
            );
            return record;
        };

        if !forecast_configured {
            tracing::warn!(
                "No year-ahead forecast configured for {} {}; reporting against actual",
                location.market,
                location.name
            );
        }

        let year_ahead = targets.year_ahead_forecast.unwrap_or(ytd);
        let ytd_forecast = if forecast_configured {
            year_ahead * day_of_year as f64 / self.days_in_year as f64
        } else {
            ytd
        };
        let std_dev = settings.forecast_std_dev;
        let ytd_p = estimate_percentile(ytd, ytd_forecast, std_dev);

        let boy = self.boy_strategy.forecast(&BoyContext {
            ytd_actual: ytd,
            year_ahead_forecast: targets.year_ahead_forecast,
            day_of_year,
            days_in_year: self.days_in_year,
        });
        let projected = project_annual_total(ytd, boy, day_of_year, self.days_in_year);
        let needed = needed_to_meet(ytd, year_ahead, day_of_year, self.days_in_year);
        let boy_p = needed.map(|n| estimate_percentile(boy, n, std_dev));
        let yoy = YoyChange::compute(ytd, prior_year_ytd);

        record.ytd_tb = Some(round2(ytd));
        record.ytd_forecast = Some(round2(ytd_forecast));
        record.ytd_p_value = Some(p_label(ytd_p));
        record.ytd_p_value_amount = Some(round2(ytd - ytd_forecast));
        record.year_ahead_forecast = Some(round2(year_ahead));
        record.boy_forecast = Some(round2(boy));
        record.boy_p_value = boy_p.map(p_label);
        record.needed_to_meet = needed.map(round2);
        record.projected_total = Some(round2(projected));
        record.yoy_change = yoy.label();
        record.yoy_change_percent = yoy.percent.map(round2);
        record.yoy_comparison_available = yoy.is_available();
        record.total_with_as = Some(round2(projected * as_proportion));
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    /// A day whose top-k minus bottom-k spread is exactly `spread`.
    fn flat_day(d: NaiveDate, spread: f64) -> DailyPriceObservation {
        let mut prices = vec![20.0; 24];
        for h in 16..20 {
            prices[h] = 20.0 + spread;
        }
        DailyPriceObservation::new(d, prices).unwrap()
    }

    fn unit_settings(market: Market) -> MarketSettings {
        MarketSettings {
            conversion: RevenueConversion {
                hours_per_day: 1.0,
                days_per_month: 1000.0,
                round_trip_efficiency: 1.0,
            },
            ..MarketSettings::defaults_for(market)
        }
    }

    #[test]
    fn test_builds_full_record() {
        let model = PerformanceModel::new(365);
        let location = Location::new("NP15", Market::Caiso);
        let history: Vec<_> = (1..=10).map(|d| flat_day(date(1, d), 8.0)).collect();
        let targets = LocationTargets {
            year_ahead_forecast: Some(292.0),
            target_p_value: None,
            as_proportion: None,
        };
        // Jan 1 + 73 days -> day_of_year 73 -> weight 0.2
        let as_of = date(3, 15);
        assert_eq!(model.day_of_year(as_of), 73);

        let record = model.build_location_performance(
            &location,
            &history,
            Some(&targets),
            &unit_settings(Market::Caiso),
            Some(6.4),
            as_of,
        );

        assert_eq!(record.location_id, "caiso_np15");
        assert_eq!(record.ytd_days_count, 10);
        assert_relative_eq!(record.ytd_tb.unwrap(), 8.0);
        assert_relative_eq!(record.ytd_forecast.unwrap(), 58.4);
        assert_eq!(record.ytd_p_value.as_deref(), Some("P5"));
        assert_relative_eq!(record.boy_forecast.unwrap(), 8.0);
        assert_relative_eq!(record.projected_total.unwrap(), 8.0);
        assert_relative_eq!(record.total_with_as.unwrap(), 8.8);
        assert_eq!(record.yoy_change, "+25.0%");
        assert!(record.yoy_comparison_available);
        assert_eq!(record.needed_p_value, "P50");
        assert_eq!(record.boy_days_remaining, 292);
        assert!(record.forecast_configured);
        assert_eq!(record.last_observation_date, Some(date(1, 10)));
    }

    #[test]
    fn test_no_data_record_has_absent_fields() {
        let model = PerformanceModel::default();
        let location = Location::new("Gunnar", Market::Ercot);
        let record = model.build_location_performance(
            &location,
            &[],
            None,
            &MarketSettings::defaults_for(Market::Ercot),
            Some(5.0),
            date(6, 1),
        );

        assert!(!record.has_data());
        assert_eq!(record.ytd_tb, None);
        assert_eq!(record.projected_total, None);
        assert_eq!(record.total_with_as, None);
        assert_eq!(record.ytd_p_value, None);
        assert!(!record.yoy_comparison_available);
        assert_eq!(record.as_proportion, 1.25);

        let json = serde_json::to_value(&record).unwrap();
        assert!(json["ytdTB4"].is_null());
        assert!(json["totalWithAS"].is_null());
        assert_eq!(json["ytdDaysCount"], 0);
    }

    #[test]
    fn test_missing_forecast_reports_p50() {
        let model = PerformanceModel::default();
        let location = Location::new("Hidden Lakes", Market::Ercot);
        let history: Vec<_> = (1..=5).map(|d| flat_day(date(2, d), 30.0)).collect();

        let record = model.build_location_performance(
            &location,
            &history,
            None,
            &MarketSettings::defaults_for(Market::Ercot),
            None,
            date(2, 5),
        );

        assert!(record.has_data());
        assert!(!record.forecast_configured);
        assert_eq!(record.ytd_p_value.as_deref(), Some("P50"));
        assert_eq!(record.ytd_forecast, record.ytd_tb);
        assert_eq!(record.yoy_change, "+0.0%");
        assert!(!record.yoy_comparison_available);
    }

    #[test]
    fn test_days_outside_window_and_bad_days_are_ignored() {
        let model = PerformanceModel::default();
        let location = Location::new("SP15", Market::Caiso);
        let mut history = vec![
            flat_day(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(), 100.0),
            flat_day(date(1, 2), 10.0),
            flat_day(date(1, 20), 100.0),
        ];
        history.push(DailyPriceObservation {
            market_date: date(1, 3),
            hourly_prices: vec![1.0; 20],
        });

        let record = model.build_location_performance(
            &location,
            &history,
            None,
            &unit_settings(Market::Caiso),
            None,
            date(1, 10),
        );

        assert_eq!(record.ytd_days_count, 1);
        assert_relative_eq!(record.ytd_tb.unwrap(), 10.0);
    }

    struct FlatForecast(f64);

    impl BalanceOfYearStrategy for FlatForecast {
        fn name(&self) -> &'static str {
            "flat"
        }

        fn forecast(&self, _ctx: &BoyContext) -> f64 {
            self.0
        }
    }

    #[test]
    fn test_custom_boy_strategy() {
        let model = PerformanceModel::new(100).with_boy_strategy(Arc::new(FlatForecast(20.0)));
        assert_eq!(model.boy_strategy_name(), "flat");

        let location = Location::new("North Hub", Market::Spp);
        let history = vec![flat_day(date(1, 1), 10.0)];
        let as_of = date(2, 20); // ordinal0 = 50
        let record = model.build_location_performance(
            &location,
            &history,
            Some(&LocationTargets {
                year_ahead_forecast: Some(15.0),
                target_p_value: Some(40),
                as_proportion: Some(2.0),
            }),
            &unit_settings(Market::Spp),
            None,
            as_of,
        );

        assert_relative_eq!(record.boy_forecast.unwrap(), 20.0);
        assert_relative_eq!(record.projected_total.unwrap(), 15.0);
        assert_relative_eq!(record.total_with_as.unwrap(), 30.0);
        assert_relative_eq!(record.needed_to_meet.unwrap(), 20.0);
        assert_eq!(record.boy_p_value.as_deref(), Some("P50"));
        assert_eq!(record.needed_p_value, "P40");
    }
}
