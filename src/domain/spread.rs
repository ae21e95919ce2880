// Peak/trough (TBx) spread calculation
use super::error::AnalyticsError;
use super::prices::HOURS_PER_DAY;
use serde::Serialize;

pub const MAX_SPREAD_HOURS: usize = HOURS_PER_DAY / 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TbCalculation {
    pub k: usize,
    pub tb_value: f64,
    /// Hour-ending indices (1..=24) of the top `k` prices, highest first.
    pub peak_hours: Vec<usize>,
    /// Hour-ending indices of the bottom `k` prices, in sorted order.
    pub trough_hours: Vec<usize>,
    pub avg_peak_price: f64,
    pub avg_trough_price: f64,
}

/// Spread between the mean of the `k` highest and `k` lowest hourly prices of a day.
///
/// Prices are paired with their hour ending and stable-sorted by descending price,
/// so ties keep their original hour order. The numeric spread does not depend on
/// which of several tied hours is reported.
pub fn compute_peak_trough_spread(
    hourly_prices: &[f64],
    k: usize,
) -> Result<TbCalculation, AnalyticsError> {
    if hourly_prices.len() != HOURS_PER_DAY {
        return Err(AnalyticsError::HourCount {
            actual: hourly_prices.len(),
        });
    }
    if k == 0 || k > MAX_SPREAD_HOURS {
        return Err(AnalyticsError::SpreadWindow { k });
    }
    if let Some((idx, value)) = hourly_prices
        .iter()
        .enumerate()
        .find(|(_, p)| !p.is_finite())
    {
        return Err(AnalyticsError::NonFinitePrice {
            hour: idx + 1,
            value: *value,
        });
    }

    let mut ranked: Vec<(usize, f64)> = hourly_prices
        .iter()
        .enumerate()
        .map(|(idx, price)| (idx + 1, *price))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let peak = &ranked[..k];
    let trough = &ranked[ranked.len() - k..];

    let avg_peak_price = mean(peak.iter().map(|(_, p)| *p));
    let avg_trough_price = mean(trough.iter().map(|(_, p)| *p));

    Ok(TbCalculation {
        k,
        tb_value: avg_peak_price - avg_trough_price,
        peak_hours: peak.iter().map(|(h, _)| *h).collect(),
        trough_hours: trough.iter().map(|(h, _)| *h).collect(),
        avg_peak_price,
        avg_trough_price,
    })
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    values.sum::<f64>() / n as f64
}
