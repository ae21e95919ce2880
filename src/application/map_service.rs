// Map service - Use case for curve-based revenue breakdowns per location
use crate::application::catalog::LocationCatalog;
use crate::application::market_data_repository::MarketDataRepository;
use crate::domain::curves::{
    select_preferred_curves, summarize_curves, CurveSource, CurveSummary, RevenueBreakdown,
    YearWindow,
};
use crate::domain::location::{CalloutPosition, Location, LocationType};
use crate::domain::market::Market;
use crate::domain::revenue::round2;
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapQuery {
    pub market: Option<Market>,
    /// `None` means every source.
    pub curve_source: Option<CurveSource>,
    pub window: YearWindow,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCurveRecord {
    pub id: String,
    pub name: String,
    pub market: Market,
    pub region: String,
    pub coordinates: (f64, f64),
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callout_position: Option<CalloutPosition>,
    pub location_type: LocationType,
    pub standard_duration: String,
    pub curves: RevenueBreakdown,
    pub curve_source: CurveSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub metadata: LocationCurveMetadata,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationCurveMetadata {
    pub db_location_name: String,
    pub aliases: Vec<String>,
}

#[derive(Clone)]
pub struct MapService {
    repository: Arc<dyn MarketDataRepository>,
    catalog: Arc<LocationCatalog>,
}

impl MapService {
    pub fn new(repository: Arc<dyn MarketDataRepository>, catalog: Arc<LocationCatalog>) -> Self {
        Self {
            repository,
            catalog,
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.repository.source_name()
    }

    /// One record per configured location; locations without a curve report zero
    /// energy arbitrage under the default source label.
    pub async fn locations(&self, query: &MapQuery) -> anyhow::Result<Vec<LocationCurveRecord>> {
        let points = self
            .repository
            .curve_points(query.market)
            .await
            .context("Failed to load revenue curves")?;

        let filtered: Vec<_> = points
            .into_iter()
            .filter(|p| query.curve_source.is_none_or(|s| p.source == s))
            .collect();
        let preferred = select_preferred_curves(summarize_curves(&filtered, query.window));

        tracing::debug!(
            "Selected {} preferred curves for {}-{}",
            preferred.len(),
            query.window.start_year,
            query.window.end_year
        );

        let records = self
            .catalog
            .select(query.market, None)
            .into_iter()
            .map(|entry| {
                let location = &entry.location;
                let curve = preferred.iter().find(|c| curve_matches(c, location));
                build_record(location, curve)
            })
            .collect();
        Ok(records)
    }

    /// Preferred curve per location for a single calendar year.
    pub async fn curves(&self, year: i32) -> anyhow::Result<Vec<CurveSummary>> {
        let points = self
            .repository
            .curve_points(None)
            .await
            .context("Failed to load revenue curves")?;
        let mut curves = select_preferred_curves(summarize_curves(&points, YearWindow::single(year)));
        for curve in &mut curves {
            curve.average_value = round2(curve.average_value);
        }
        Ok(curves)
    }
}

fn curve_matches(curve: &CurveSummary, location: &Location) -> bool {
    curve.market == location.market && curve.location.eq_ignore_ascii_case(&location.name)
}

fn build_record(location: &Location, curve: Option<&CurveSummary>) -> LocationCurveRecord {
    let aliases = if location.aliases.is_empty() {
        vec![location.region.clone()]
    } else {
        location.aliases.clone()
    };
    LocationCurveRecord {
        id: location.location_id(),
        name: location.display_name().to_string(),
        market: location.market,
        region: location.region.clone(),
        coordinates: location.coordinates,
        callout_position: location.callout,
        location_type: location.location_type,
        standard_duration: location.standard_duration.clone(),
        curves: RevenueBreakdown::from_curve(curve, location.capacity),
        curve_source: curve.map(|c| c.curve_source).unwrap_or(CurveSource::GridStor),
        duration: location.duration_label.clone(),
        metadata: LocationCurveMetadata {
            db_location_name: location.name.clone(),
            aliases,
        },
    }
}
