use thiserror::Error;

/// Validation failures for a single symbol's snapshot.
///
/// All variants are fatal to that symbol's evaluation cycle only; callers
/// skip the symbol and continue the batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignalError {
    #[error("missing required indicators: {0}")]
    MissingIndicator(String),

    #[error("invalid prices: open={open}, close={close} (prices must be positive)")]
    InvalidPrice { open: f64, close: f64 },

    #[error("invalid Bollinger Bands: upper={upper} must be > lower={lower}")]
    InvalidBands { upper: f64, lower: f64 },

    #[error("{name} out of range: {value} (must be {min}-{max})")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}
