// Market domain model
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Independent system operators covered by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    Caiso,
    Ercot,
    Spp,
}

impl Market {
    pub const ALL: [Market; 3] = [Market::Caiso, Market::Ercot, Market::Spp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Caiso => "CAISO",
            Market::Ercot => "ERCOT",
            Market::Spp => "SPP",
        }
    }

    /// Number of peak and trough hours in the market's spread (TB4 vs TB2).
    pub fn default_spread_hours(&self) -> usize {
        match self {
            Market::Ercot => 2,
            Market::Caiso | Market::Spp => 4,
        }
    }

    pub fn default_as_proportion(&self) -> f64 {
        match self {
            Market::Caiso => 1.10,
            Market::Ercot => 1.25,
            Market::Spp => 1.34,
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown market '{0}', expected one of CAISO, ERCOT, SPP")]
pub struct UnknownMarket(pub String);

impl FromStr for Market {
    type Err = UnknownMarket;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CAISO" => Ok(Market::Caiso),
            "ERCOT" => Ok(Market::Ercot),
            "SPP" => Ok(Market::Spp),
            _ => Err(UnknownMarket(s.to_string())),
        }
    }
}

/// Label for a spread over `k` hours, e.g. "TB4".
pub fn tb_label(k: usize) -> String {
    format!("TB{}", k)
}
