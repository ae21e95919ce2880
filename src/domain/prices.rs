// Hourly price domain models
use super::error::AnalyticsError;
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const HOURS_PER_DAY: usize = 24;

/// One hourly price (hour ending 1..=24, $/MWh).
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyPrice {
    pub market_date: NaiveDate,
    pub hour_ending: u8,
    pub price: f64,
}

impl HourlyPrice {
    pub fn new(market_date: NaiveDate, hour_ending: u8, price: f64) -> Self {
        Self {
            market_date,
            hour_ending,
            price,
        }
    }
}

/// A complete day of 24 hourly prices for one location.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPriceObservation {
    pub market_date: NaiveDate,
    pub hourly_prices: Vec<f64>,
}

impl DailyPriceObservation {
    pub fn new(market_date: NaiveDate, hourly_prices: Vec<f64>) -> Result<Self, AnalyticsError> {
        if hourly_prices.len() != HOURS_PER_DAY {
            return Err(AnalyticsError::HourCount {
                actual: hourly_prices.len(),
            });
        }
        Ok(Self {
            market_date,
            hourly_prices,
        })
    }
}

/// Group loose hourly rows into complete days.
///
/// A day is kept only when every hour ending 1..=24 is present exactly once;
/// partial days are dropped rather than imputed. Returns the kept days in date
/// order together with the dates that were dropped.
pub fn assemble_days(rows: &[HourlyPrice]) -> (Vec<DailyPriceObservation>, Vec<NaiveDate>) {
    let mut by_day: BTreeMap<NaiveDate, [Option<f64>; HOURS_PER_DAY]> = BTreeMap::new();
    let mut invalid: Vec<NaiveDate> = Vec::new();

    for row in rows {
        let slots = by_day.entry(row.market_date).or_insert([None; HOURS_PER_DAY]);
        let he = row.hour_ending as usize;
        if !(1..=HOURS_PER_DAY).contains(&he) {
            invalid.push(row.market_date);
            continue;
        }
        if slots[he - 1].replace(row.price).is_some() {
            invalid.push(row.market_date);
        }
    }

    let mut days = Vec::new();
    let mut dropped = Vec::new();
    for (date, slots) in by_day {
        let complete: Option<Vec<f64>> = slots.iter().copied().collect();
        match complete {
            Some(prices) if !invalid.contains(&date) => {
                match DailyPriceObservation::new(date, prices) {
                    Ok(day) => days.push(day),
                    Err(_) => dropped.push(date),
                }
            }
            _ => dropped.push(date),
        }
    }

    (days, dropped)
}
