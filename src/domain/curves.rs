// Forecast revenue curve domain models
use super::market::Market;
use super::revenue::round2;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::str::FromStr;

/// Ancillary services revenue as a share of energy arbitrage on the map.
pub const AS_SHARE_OF_ENERGY_ARBITRAGE: f64 = 0.12;
/// Horizon used for the "lifetime" year window.
pub const PROJECT_LIFETIME_YEARS: i32 = 30;
/// `years` query value meaning "lifetime".
pub const LIFETIME_SENTINEL: i32 = 999;

/// Curve publisher, in descending order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CurveSource {
    GridStor,
    Aurora,
    Ascend,
    Other,
}

impl CurveSource {
    pub fn priority(&self) -> u8 {
        match self {
            CurveSource::GridStor => 1,
            CurveSource::Aurora => 2,
            CurveSource::Ascend => 3,
            CurveSource::Other => 4,
        }
    }

    pub fn from_creator(created_by: &str) -> Self {
        created_by.parse().unwrap_or(CurveSource::Other)
    }

    pub fn label(&self) -> &'static str {
        match self {
            CurveSource::GridStor => "GridStor P50",
            CurveSource::Aurora => "Aurora Base",
            CurveSource::Ascend | CurveSource::Other => "ASCEND",
        }
    }
}

impl FromStr for CurveSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gridstor" => Ok(CurveSource::GridStor),
            "aurora" => Ok(CurveSource::Aurora),
            "ascend" => Ok(CurveSource::Ascend),
            other => Err(format!("unknown curve source '{}'", other)),
        }
    }
}

impl Serialize for CurveSource {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// One monthly value of a revenue curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CurvePoint {
    pub location: String,
    pub market: Market,
    pub battery_duration: f64,
    pub source: CurveSource,
    pub timestamp: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveSummary {
    pub location: String,
    pub market: Market,
    pub battery_duration: f64,
    pub curve_source: CurveSource,
    pub average_value: f64,
    /// Distinct months contributing to the average.
    pub data_points: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearWindow {
    pub start_year: i32,
    pub end_year: i32,
}

impl YearWindow {
    pub fn single(year: i32) -> Self {
        Self {
            start_year: year,
            end_year: year,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.start_year..=self.end_year).contains(&date.year())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidYearWindow {
    #[error("startYear {start} is after endYear {end}")]
    Inverted { start: i32, end: i32 },

    #[error("years={years} is out of range")]
    OutOfRange { years: i32 },
}

/// Year range for curve averaging. `years` overrides explicit bounds and counts
/// from the current year; [`LIFETIME_SENTINEL`] spans the project lifetime.
pub fn resolve_year_window(
    start_year: Option<i32>,
    end_year: Option<i32>,
    years: Option<i32>,
    current_year: i32,
) -> Result<YearWindow, InvalidYearWindow> {
    let span_end = |span: i32| {
        current_year
            .checked_add(span)
            .ok_or(InvalidYearWindow::OutOfRange {
                years: years.unwrap_or(span),
            })
    };
    let (start, end) = match years {
        Some(LIFETIME_SENTINEL) => (current_year, span_end(PROJECT_LIFETIME_YEARS)?),
        Some(n) if n > 0 => (current_year, span_end(n - 1)?),
        _ => (
            start_year.unwrap_or(current_year),
            end_year.unwrap_or(current_year),
        ),
    };
    if start > end {
        return Err(InvalidYearWindow::Inverted { start, end });
    }
    Ok(YearWindow {
        start_year: start,
        end_year: end,
    })
}

/// Average each curve (location, market, duration, source) over the window.
pub fn summarize_curves(points: &[CurvePoint], window: YearWindow) -> Vec<CurveSummary> {
    type Key = (String, Market, u64, CurveSource);
    let mut groups: BTreeMap<Key, (f64, usize, BTreeSet<(i32, u32)>, f64)> = BTreeMap::new();

    for p in points.iter().filter(|p| window.contains(p.timestamp)) {
        let key = (
            p.location.clone(),
            p.market,
            p.battery_duration.to_bits(),
            p.source,
        );
        let entry = groups
            .entry(key)
            .or_insert((0.0, 0, BTreeSet::new(), p.battery_duration));
        entry.0 += p.value;
        entry.1 += 1;
        entry.2.insert((p.timestamp.year(), p.timestamp.month()));
    }

    groups
        .into_iter()
        .map(|((location, market, _, source), (sum, n, months, duration))| CurveSummary {
            location,
            market,
            battery_duration: duration,
            curve_source: source,
            average_value: sum / n as f64,
            data_points: months.len(),
        })
        .collect()
}

/// Keep the highest-priority curve per (market, location); ties go to the longer duration.
pub fn select_preferred_curves(summaries: Vec<CurveSummary>) -> Vec<CurveSummary> {
    let mut best: HashMap<(Market, String), CurveSummary> = HashMap::new();
    for summary in summaries {
        let key = (summary.market, summary.location.to_lowercase());
        match best.get(&key) {
            Some(current) if !is_preferred(&summary, current) => {}
            _ => {
                best.insert(key, summary);
            }
        }
    }
    let mut selected: Vec<CurveSummary> = best.into_values().collect();
    selected.sort_by(|a, b| (a.market, &a.location).cmp(&(b.market, &b.location)));
    selected
}

fn is_preferred(candidate: &CurveSummary, current: &CurveSummary) -> bool {
    let (cp, kp) = (candidate.curve_source.priority(), current.curve_source.priority());
    cp < kp || (cp == kp && candidate.battery_duration > current.battery_duration)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueBreakdown {
    pub energy_arbitrage: f64,
    pub ancillary_services: f64,
    pub capacity: f64,
}

impl RevenueBreakdown {
    /// Energy arbitrage from the curve average (zero without a curve), AS as a fixed share.
    pub fn from_curve(curve: Option<&CurveSummary>, capacity: f64) -> Self {
        let energy_arbitrage = curve.map(|c| round2(c.average_value)).unwrap_or(0.0);
        Self {
            energy_arbitrage,
            ancillary_services: round2(energy_arbitrage * AS_SHARE_OF_ENERGY_ARBITRAGE),
            capacity,
        }
    }
}
