// Analytics error types

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyticsError {
    #[error("expected 24 hourly prices, got {actual}")]
    HourCount { actual: usize },

    #[error("spread window must be between 1 and 12 hours, got {k}")]
    SpreadWindow { k: usize },

    #[error("non-finite price {value} at hour ending {hour}")]
    NonFinitePrice { hour: usize, value: f64 },
}
