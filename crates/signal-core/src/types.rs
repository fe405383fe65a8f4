use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{RATING_MAX, RATING_MIN};
use crate::error::SignalError;

/// Five-tier trading signal.
///
/// Serialized in SCREAMING_SNAKE_CASE ("STRONG_BUY", ...) to match the wire
/// format consumed by report renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    StrongSell,
}

impl Signal {
    /// Map a rating to a signal using the mean-reversion tiering shared by
    /// Bollinger, Stochastic RSI, ADX, CCI and the composite: only readings
    /// of magnitude >= 2 escape NEUTRAL. MACD uses its own stricter mapping
    /// where weak +/-1 readings already count as BUY/SELL.
    pub fn from_rating(rating: i32) -> Self {
        if rating <= -RATING_MAX {
            Signal::StrongBuy
        } else if rating == -2 {
            Signal::Buy
        } else if rating >= RATING_MAX {
            Signal::StrongSell
        } else if rating == 2 {
            Signal::Sell
        } else {
            Signal::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::StrongBuy => "STRONG_BUY",
            Signal::Buy => "BUY",
            Signal::Neutral => "NEUTRAL",
            Signal::Sell => "SELL",
            Signal::StrongSell => "STRONG_SELL",
        }
    }
}

/// One symbol's technical-indicator readings for a single evaluation cycle.
///
/// Constructed once per cycle and never mutated. Field renames keep the
/// serialized form identical to the market-data adapter's dotted key set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub open: f64,
    pub close: f64,
    #[serde(rename = "SMA20")]
    pub sma20: f64,
    #[serde(rename = "BB.upper")]
    pub bb_upper: f64,
    #[serde(rename = "BB.lower")]
    pub bb_lower: f64,
    #[serde(rename = "StochRSI.K")]
    pub stoch_k: f64,
    #[serde(rename = "StochRSI.D")]
    pub stoch_d: f64,
    #[serde(rename = "MACD")]
    pub macd: f64,
    #[serde(rename = "MACD.signal")]
    pub macd_signal: f64,
    #[serde(rename = "MACD.histogram")]
    pub macd_histogram: f64,
    #[serde(rename = "ADX")]
    pub adx: f64,
    #[serde(rename = "ADX.plus_di")]
    pub plus_di: f64,
    #[serde(rename = "ADX.minus_di")]
    pub minus_di: f64,
    #[serde(rename = "CCI")]
    pub cci: f64,
}

impl IndicatorSnapshot {
    /// External keys a snapshot mapping must carry.
    pub const REQUIRED_KEYS: [&'static str; 14] = [
        "open",
        "close",
        "SMA20",
        "BB.upper",
        "BB.lower",
        "StochRSI.K",
        "StochRSI.D",
        "MACD",
        "MACD.signal",
        "MACD.histogram",
        "ADX",
        "ADX.plus_di",
        "ADX.minus_di",
        "CCI",
    ];

    /// Build a snapshot from an adapter-supplied JSON mapping.
    ///
    /// Fails closed: every absent or non-numeric key is reported in a single
    /// `MissingIndicator` error so the caller sees the full gap at once.
    pub fn from_json(value: &Value) -> Result<Self, SignalError> {
        let map = value.as_object().ok_or_else(|| {
            SignalError::MissingIndicator(Self::REQUIRED_KEYS.join(", "))
        })?;

        let missing: Vec<&str> = Self::REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| !map.get(*key).map(Value::is_number).unwrap_or(false))
            .collect();
        if !missing.is_empty() {
            return Err(SignalError::MissingIndicator(missing.join(", ")));
        }

        let get = |key: &str| map[key].as_f64().unwrap_or_default();
        Ok(Self {
            open: get("open"),
            close: get("close"),
            sma20: get("SMA20"),
            bb_upper: get("BB.upper"),
            bb_lower: get("BB.lower"),
            stoch_k: get("StochRSI.K"),
            stoch_d: get("StochRSI.D"),
            macd: get("MACD"),
            macd_signal: get("MACD.signal"),
            macd_histogram: get("MACD.histogram"),
            adx: get("ADX"),
            plus_di: get("ADX.plus_di"),
            minus_di: get("ADX.minus_di"),
            cci: get("CCI"),
        })
    }
}

/// Indicator consensus counts behind a composite rating.
///
/// Counts are taken over the raw, unweighted per-indicator ratings using the
/// bearish-positive sign convention: a negative rating counts as bullish.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalBreakdown {
    pub raw_score: f64,
    pub bullish_indicators: u32,
    pub bearish_indicators: u32,
    pub neutral_indicators: u32,
    pub total_indicators: u32,
}

/// Weighted aggregate of all indicator ratings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeSignal {
    /// Rounded weighted mean of the per-indicator ratings, clamped to [-3, 3].
    pub rating: i32,
    pub signal: Signal,
    pub breakdown: SignalBreakdown,
    /// ADX-derived trend strength in [0, 1].
    pub trend_strength: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandPosition {
    AboveUpper,
    InRange,
    BelowLower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OscillatorPosition {
    Overbought,
    Oversold,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdPosition {
    AboveSignal,
    BelowSignal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendQuality {
    Strong,
    Weak,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BollingerReport {
    pub rating: i32,
    pub signal: Signal,
    /// Band width (upper - lower) / middle; None when the middle band is 0.
    pub width: Option<f64>,
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
    pub position: BandPosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StochasticReport {
    pub rating: i32,
    pub signal: Signal,
    pub k: f64,
    pub d: f64,
    pub position: OscillatorPosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacdReport {
    pub rating: i32,
    pub signal: Signal,
    pub value: f64,
    pub signal_line: f64,
    pub histogram: f64,
    pub position: MacdPosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdxReport {
    pub rating: i32,
    pub signal: Signal,
    pub value: f64,
    pub plus_di: f64,
    pub minus_di: f64,
    pub trend_strength: f64,
    pub trend_quality: TrendQuality,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CciReport {
    pub rating: i32,
    pub signal: Signal,
    pub value: f64,
    pub position: OscillatorPosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorReports {
    pub bollinger_bands: BollingerReport,
    pub stochastic_rsi: StochasticReport,
    pub macd: MacdReport,
    pub adx: AdxReport,
    pub cci: CciReport,
}

/// Full aggregator output for one symbol, consumed by the report renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolReport {
    pub price: f64,
    /// Open-to-close percentage change.
    pub change: f64,
    pub composite: CompositeSignal,
    pub indicators: IndicatorReports,
}

/// Clamp a rating into the [-3, 3] scale.
pub fn clamp_rating(rating: i32) -> i32 {
    rating.clamp(RATING_MIN, RATING_MAX)
}
