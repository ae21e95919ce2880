// Location domain model
use super::market::Market;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationType {
    Hub,
    Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalloutPosition {
    pub x: f64,
    pub y: f64,
}

/// A priced market location (hub or node) as defined in static configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Location {
    pub name: String,
    pub market: Market,
    #[serde(default = "default_location_type")]
    pub location_type: LocationType,
    #[serde(default = "default_standard_duration")]
    pub standard_duration: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub region: String,
    /// Longitude, latitude.
    #[serde(default)]
    pub coordinates: (f64, f64),
    #[serde(default)]
    pub callout: Option<CalloutPosition>,
    /// Fixed capacity revenue, $/kW-month.
    #[serde(default)]
    pub capacity: f64,
    #[serde(default)]
    pub duration_label: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

fn default_location_type() -> LocationType {
    LocationType::Node
}

fn default_standard_duration() -> String {
    "4h".to_string()
}

impl Location {
    pub fn new(name: impl Into<String>, market: Market) -> Self {
        Self {
            name: name.into(),
            market,
            location_type: LocationType::Node,
            standard_duration: default_standard_duration(),
            display_name: None,
            region: String::new(),
            coordinates: (0.0, 0.0),
            callout: None,
            capacity: 0.0,
            duration_label: None,
            aliases: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn with_type(mut self, location_type: LocationType) -> Self {
        self.location_type = location_type;
        self
    }

    #[cfg(test)]
    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.standard_duration = duration.into();
        self
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    /// Stable identifier, e.g. "ercot_houston_hub".
    pub fn location_id(&self) -> String {
        let slug = self
            .name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .to_lowercase();
        format!("{}_{}", self.market.as_str().to_lowercase(), slug)
    }

    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
            || self
                .display_name
                .as_deref()
                .is_some_and(|d| d.eq_ignore_ascii_case(name.trim()))
    }
}
