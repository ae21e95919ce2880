// Revenue formulas over daily spreads
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

pub const DEFAULT_DAYS_IN_YEAR: u32 = 365;
pub const DEFAULT_FORECAST_STD_DEV: f64 = 1.5;

/// Percentile points per standard deviation used by [`estimate_percentile`].
pub const PERCENTILE_SLOPE: f64 = 22.5;
pub const MIN_PERCENTILE: f64 = 5.0;
pub const MAX_PERCENTILE: f64 = 95.0;

/// Converts a $/MWh daily spread into $/kW-month of arbitrage revenue.
///
/// `value = tb * hours_per_day * days_per_month * round_trip_efficiency / 1000`.
/// This is a modeling assumption, so every factor is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RevenueConversion {
    pub hours_per_day: f64,
    #[serde(default = "default_days_per_month")]
    pub days_per_month: f64,
    #[serde(default = "default_round_trip_efficiency")]
    pub round_trip_efficiency: f64,
}

fn default_days_per_month() -> f64 {
    30.4
}

fn default_round_trip_efficiency() -> f64 {
    0.85
}

impl RevenueConversion {
    /// Conversion for a battery discharging over the spread window once a day.
    pub fn for_spread_hours(k: usize) -> Self {
        Self {
            hours_per_day: k as f64,
            days_per_month: default_days_per_month(),
            round_trip_efficiency: default_round_trip_efficiency(),
        }
    }

    pub fn to_kw_month(&self, tb_per_mwh: f64) -> f64 {
        tb_per_mwh * self.hours_per_day * self.days_per_month * self.round_trip_efficiency / 1000.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySpread {
    pub date: NaiveDate,
    pub tb_value: f64,
}

impl DailySpread {
    pub fn new(date: NaiveDate, tb_value: f64) -> Self {
        Self { date, tb_value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YtdAggregate {
    /// Mean daily spread in $/kW-month; `None` when no day qualified.
    pub ytd_average_tb: Option<f64>,
    pub ytd_days_count: usize,
}

impl YtdAggregate {
    pub fn has_data(&self) -> bool {
        self.ytd_average_tb.is_some()
    }
}

pub fn year_start(as_of: NaiveDate) -> NaiveDate {
    as_of.with_ordinal(1).unwrap_or(as_of)
}

/// Mean of the daily spreads dated within `[Jan 1, as_of]` of `as_of`'s year.
///
/// Days outside the window are ignored. An empty window yields `None`, never zero.
pub fn aggregate_ytd(
    daily: &[DailySpread],
    as_of: NaiveDate,
    conversion: &RevenueConversion,
) -> YtdAggregate {
    let start = year_start(as_of);
    let in_window: Vec<f64> = daily
        .iter()
        .filter(|d| d.date >= start && d.date <= as_of)
        .map(|d| d.tb_value)
        .collect();

    if in_window.is_empty() {
        return YtdAggregate {
            ytd_average_tb: None,
            ytd_days_count: 0,
        };
    }

    let mean = in_window.iter().sum::<f64>() / in_window.len() as f64;
    YtdAggregate {
        ytd_average_tb: Some(conversion.to_kw_month(mean)),
        ytd_days_count: in_window.len(),
    }
}

/// Display heuristic placing `actual` on a forecast distribution, as a "P" label number.
///
/// `50 + 22.5 * z` clamped to `[5, 95]` and rounded, where
/// `z = (actual - forecast) / std_dev`. This is a linear stand-in for a normal CDF
/// (roughly -2σ = P5, +2σ = P95) with no statistical rigor; dashboards depend on its
/// exact output. A zero forecast reports P50.
pub fn estimate_percentile(actual: f64, forecast: f64, std_dev: f64) -> u8 {
    if forecast == 0.0 {
        return 50;
    }
    let z = (actual - forecast) / std_dev;
    if z.is_nan() {
        return 50;
    }
    let percentile = (50.0 + z * PERCENTILE_SLOPE).clamp(MIN_PERCENTILE, MAX_PERCENTILE);
    percentile.round() as u8
}

pub fn p_label(percentile: u8) -> String {
    format!("P{}", percentile)
}

/// Day-weighted blend of year-to-date actual and balance-of-year forecast.
///
/// `days_in_year` carries no leap-year adjustment; callers pass the configured value.
pub fn project_annual_total(
    ytd_actual: f64,
    boy_forecast: f64,
    as_of_day_of_year: u32,
    days_in_year: u32,
) -> f64 {
    if days_in_year == 0 {
        return ytd_actual;
    }
    let elapsed = as_of_day_of_year.min(days_in_year) as f64;
    let total = days_in_year as f64;
    let ytd_weight = elapsed / total;
    let boy_weight = (total - elapsed) / total;
    ytd_actual * ytd_weight + boy_forecast * boy_weight
}

/// Average the balance of the year must reach for the blended total to hit `annual_target`.
///
/// `None` once no days remain.
pub fn needed_to_meet(
    ytd_actual: f64,
    annual_target: f64,
    as_of_day_of_year: u32,
    days_in_year: u32,
) -> Option<f64> {
    if as_of_day_of_year >= days_in_year {
        return None;
    }
    let total = days_in_year as f64;
    let ytd_weight = as_of_day_of_year as f64 / total;
    let boy_weight = 1.0 - ytd_weight;
    Some((annual_target - ytd_actual * ytd_weight) / boy_weight)
}

/// Year-over-year change, keeping track of whether a prior value existed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoyChange {
    pub percent: Option<f64>,
}

impl YoyChange {
    pub fn compute(current: f64, prior: Option<f64>) -> Self {
        let percent = prior
            .filter(|p| *p > 0.0 && p.is_finite())
            .map(|p| (current - p) / p * 100.0);
        Self { percent }
    }

    pub fn unavailable() -> Self {
        Self { percent: None }
    }

    pub fn is_available(&self) -> bool {
        self.percent.is_some()
    }

    /// Signed one-decimal label; "+0.0%" when no comparison exists.
    pub fn label(&self) -> String {
        match self.percent {
            Some(p) if p >= 0.0 => format!("+{:.1}%", p),
            Some(p) => format!("{:.1}%", p),
            None => "+0.0%".to_string(),
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
