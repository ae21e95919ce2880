// Location catalog - static locations, targets and market settings
use crate::domain::location::Location;
use crate::domain::market::Market;
use crate::domain::performance::{LocationTargets, MarketSettings};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub location: Location,
    pub targets: Option<LocationTargets>,
}

#[derive(Debug, Clone, Default)]
pub struct LocationCatalog {
    entries: Vec<CatalogEntry>,
    markets: HashMap<Market, MarketSettings>,
}

impl LocationCatalog {
    pub fn new(entries: Vec<CatalogEntry>, markets: HashMap<Market, MarketSettings>) -> Self {
        Self { entries, markets }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Configured settings for `market`, or the built-in defaults.
    pub fn settings(&self, market: Market) -> MarketSettings {
        self.markets
            .get(&market)
            .cloned()
            .unwrap_or_else(|| MarketSettings::defaults_for(market))
    }

    pub fn select(&self, market: Option<Market>, name: Option<&str>) -> Vec<&CatalogEntry> {
        self.entries
            .iter()
            .filter(|e| market.is_none_or(|m| e.location.market == m))
            .filter(|e| name.is_none_or(|n| e.location.matches_name(n)))
            .collect()
    }
}
