use crate::application::catalog::{CatalogEntry, LocationCatalog};
use crate::domain::location::Location;
use crate::domain::market::Market;
use crate::domain::performance::{LocationTargets, MarketSettings};
use crate::domain::proxy_route::{AssetOrigins, AssetRoute, ProxyRoute};
use crate::domain::revenue::{RevenueConversion, DEFAULT_DAYS_IN_YEAR};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "config/gridstor";
pub const ENV_PREFIX: &str = "GRIDSTOR";

const DAYZER_ORIGIN: &str = "https://gridstordayzer.netlify.app";
const CURVE_VIEWER_ORIGIN: &str = "https://gridstor.netlify.app";
const FUNDAMENTALS_ORIGIN: &str = "https://gst-fundamentals.netlify.app";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub analytics: AnalyticsSettings,
    #[serde(default)]
    pub http_client: HttpClientSettings,
    #[serde(default)]
    pub markets: Vec<MarketConfig>,
    #[serde(default)]
    pub locations: Vec<LocationConfig>,
    #[serde(default)]
    pub proxy: ProxySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsSettings {
    #[serde(default = "default_days_in_year")]
    pub days_in_year: u32,
    /// Fixed evaluation date; today (UTC) when unset.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self {
            days_in_year: default_days_in_year(),
            as_of: None,
            data_dir: default_data_dir(),
        }
    }
}

fn default_days_in_year() -> u32 {
    DEFAULT_DAYS_IN_YEAR
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpClientSettings {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for HttpClientSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Overrides for one market; unset fields keep the market defaults.
#[derive(Debug, Deserialize, Clone)]
pub struct MarketConfig {
    pub market: Market,
    pub spread_hours: Option<usize>,
    pub as_proportion: Option<f64>,
    pub default_target_p_value: Option<u8>,
    pub forecast_std_dev: Option<f64>,
    pub conversion: Option<RevenueConversion>,
}

impl MarketConfig {
    pub fn to_settings(&self) -> MarketSettings {
        let defaults = MarketSettings::defaults_for(self.market);
        let spread_hours = self.spread_hours.unwrap_or(defaults.spread_hours);
        MarketSettings {
            market: self.market,
            spread_hours,
            as_proportion: self.as_proportion.unwrap_or(defaults.as_proportion),
            default_target_p_value: self
                .default_target_p_value
                .unwrap_or(defaults.default_target_p_value),
            forecast_std_dev: self.forecast_std_dev.unwrap_or(defaults.forecast_std_dev),
            conversion: self
                .conversion
                .unwrap_or_else(|| RevenueConversion::for_spread_hours(spread_hours)),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocationConfig {
    #[serde(flatten)]
    pub location: Location,
    #[serde(default)]
    pub targets: Option<LocationTargets>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProxySettings {
    #[serde(default = "default_routes")]
    pub routes: Vec<ProxyRoute>,
    #[serde(default = "default_asset_origins")]
    pub assets: AssetOrigins,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            routes: default_routes(),
            assets: default_asset_origins(),
        }
    }
}

fn default_routes() -> Vec<ProxyRoute> {
    vec![
        ProxyRoute::new("/dayzer", DAYZER_ORIGIN),
        ProxyRoute::new("/curve-viewer", CURVE_VIEWER_ORIGIN),
    ]
}

fn default_asset_origins() -> AssetOrigins {
    let route = |marker: &str, origin: &str| AssetRoute {
        referer_marker: marker.to_string(),
        origin: origin.to_string(),
    };
    AssetOrigins {
        routes: vec![
            route("/short-term-outlook", DAYZER_ORIGIN),
            route("/long-term-outlook", CURVE_VIEWER_ORIGIN),
            route("/curve-viewer", CURVE_VIEWER_ORIGIN),
            route("/admin", CURVE_VIEWER_ORIGIN),
            route("/fundamentals", FUNDAMENTALS_ORIGIN),
        ],
        default_origin: DAYZER_ORIGIN.to_string(),
        fallback_origin: Some(CURVE_VIEWER_ORIGIN.to_string()),
    }
}

impl AppConfig {
    pub fn catalog(&self) -> LocationCatalog {
        let entries = self
            .locations
            .iter()
            .map(|l| CatalogEntry {
                location: l.location.clone(),
                targets: l.targets.clone(),
            })
            .collect();
        let markets: HashMap<Market, MarketSettings> = self
            .markets
            .iter()
            .map(|m| (m.market, m.to_settings()))
            .collect();
        LocationCatalog::new(entries, markets)
    }

    /// Configured proxy routes with prefixes and origins normalized.
    pub fn proxy_routes(&self) -> Vec<ProxyRoute> {
        self.proxy
            .routes
            .iter()
            .map(|r| ProxyRoute::new(&r.prefix, &r.origin))
            .collect()
    }
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    load_app_config_from(DEFAULT_CONFIG_PATH)
}

/// Loads `path` (any format the config crate recognizes, extension optional) and
/// applies `GRIDSTOR__SECTION__KEY` environment overrides on top.
pub fn load_app_config_from(path: &str) -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
