// HTTP request handlers for the analytics API
use crate::application::map_service::MapQuery;
use crate::domain::curves::{resolve_year_window, CurveSource};
use crate::domain::market::Market;
use crate::infrastructure::http_response::{json_envelope, ApiError, CACHE_DEFAULT, CACHE_EMPTY};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Query, State},
    response::Response,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct PerformanceQuery {
    pub market: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapLocationsQuery {
    pub market: Option<String>,
    pub curve_source: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub years: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct MapCurvesQuery {
    pub year: Option<i32>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Empty, missing and "all" mean no market filter.
fn parse_market(value: Option<&str>) -> Result<Option<Market>, ApiError> {
    match non_empty(value) {
        None => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("all") => Ok(None),
        Some(v) => v
            .parse::<Market>()
            .map(Some)
            .map_err(|e| ApiError::bad_request("Invalid market", e)),
    }
}

fn parse_curve_source(value: Option<&str>) -> Result<Option<CurveSource>, ApiError> {
    match non_empty(value) {
        None => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("all") => Ok(None),
        Some(v) => v
            .parse::<CurveSource>()
            .map(Some)
            .map_err(|e| ApiError::bad_request("Invalid curveSource", e)),
    }
}

/// YTD performance per market and location
pub async fn market_performance(
    Query(query): Query<PerformanceQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let market = parse_market(query.market.as_deref())?;
    let location = non_empty(query.location.as_deref());
    let as_of = state.as_of();

    let data = state
        .performance_service
        .market_performance(market, location, as_of)
        .await;

    let record_count: usize = data.iter().map(|m| m.locations.len()).sum();
    let with_data: usize = data
        .iter()
        .map(|m| m.locations.iter().filter(|l| l.has_data()).count())
        .sum();

    let mut metadata = json!({
        "timestamp": Utc::now().to_rfc3339(),
        "requestedMarket": market.map(|m| m.as_str()).unwrap_or("all"),
        "dataSource": state.performance_service.source_name(),
        "recordCount": record_count,
        "asOf": as_of,
    });

    if with_data == 0 {
        tracing::warn!(
            "No price data for market={:?} location={:?} as of {}",
            market,
            location,
            as_of
        );
        metadata["warning"] = json!("No price data available for the requested selection.");
        return Ok(json_envelope(data, metadata, CACHE_EMPTY));
    }

    Ok(json_envelope(data, metadata, CACHE_DEFAULT))
}

/// Curve-based revenue breakdown for every map location
pub async fn map_locations(
    Query(query): Query<MapLocationsQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let market = parse_market(query.market.as_deref())?;
    let curve_source = parse_curve_source(query.curve_source.as_deref())?;
    let current_year = state.as_of().year();
    let window = resolve_year_window(query.start_year, query.end_year, query.years, current_year)
        .map_err(|e| ApiError::bad_request("Invalid year range", e))?;

    let map_query = MapQuery {
        market,
        curve_source,
        window,
    };
    let locations = state
        .map_service
        .locations(&map_query)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch location data", e))?;

    let metadata = json!({
        "total": locations.len(),
        "timestamp": Utc::now().to_rfc3339(),
        "source": state.map_service.source_name(),
        "filters": {
            "market": market.map(|m| m.as_str()).unwrap_or("all"),
            "curveSource": curve_source.map(|s| s.label()).unwrap_or("all"),
            "startYear": window.start_year,
            "endYear": window.end_year,
        },
    });
    Ok(json_envelope(locations, metadata, CACHE_DEFAULT))
}

/// Preferred revenue curve per location for one year
pub async fn map_curves(
    Query(query): Query<MapCurvesQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, ApiError> {
    let year = query.year.unwrap_or_else(|| state.as_of().year());
    let curves = state
        .map_service
        .curves(year)
        .await
        .map_err(|e| ApiError::internal("Failed to fetch curve data", e))?;

    let metadata = json!({
        "total": curves.len(),
        "timestamp": Utc::now().to_rfc3339(),
        "source": state.map_service.source_name(),
        "year": year,
    });
    Ok(json_envelope(curves, metadata, CACHE_DEFAULT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_market() {
        assert_eq!(parse_market(None).unwrap(), None);
        assert_eq!(parse_market(Some("")).unwrap(), None);
        assert_eq!(parse_market(Some("all")).unwrap(), None);
        assert_eq!(parse_market(Some("ercot")).unwrap(), Some(Market::Ercot));
        assert!(matches!(
            parse_market(Some("PJM")),
            Err(ApiError::BadRequest { .. })
        ));
    }

    #[test]
    fn test_parse_curve_source() {
        assert_eq!(parse_curve_source(Some("all")).unwrap(), None);
        assert_eq!(
            parse_curve_source(Some("Aurora")).unwrap(),
            Some(CurveSource::Aurora)
        );
        assert!(parse_curve_source(Some("Bloomberg")).is_err());
    }
}
