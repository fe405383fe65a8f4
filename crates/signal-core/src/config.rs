use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Rating scale bounds shared by every indicator and the composite.
pub const RATING_MIN: i32 = -3;
pub const RATING_MAX: i32 = 3;

/// Valid domain for Stochastic RSI K/D and ADX.
pub const OSCILLATOR_MIN: f64 = 0.0;
pub const OSCILLATOR_MAX: f64 = 100.0;

/// Prices at or below this value are rejected by validation.
pub const MIN_VALID_PRICE: f64 = 0.0;

/// Per-indicator weights used by the composite aggregator.
///
/// Any weight missing from a caller-supplied map defaults to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndicatorWeights {
    pub bb: f64,
    pub stoch_rsi: f64,
    pub macd: f64,
    pub adx: f64,
    pub cci: f64,
}

impl Default for IndicatorWeights {
    fn default() -> Self {
        Self {
            bb: 1.0,
            stoch_rsi: 1.2, // slightly higher weight for momentum
            macd: 1.0,
            adx: 0.8, // ADX is more for trend confirmation
            cci: 1.0,
        }
    }
}

impl IndicatorWeights {
    /// Build weights from a name-keyed map; missing keys default to 1.0.
    pub fn from_map(weights: &HashMap<String, f64>) -> Self {
        let get = |key: &str| weights.get(key).copied().unwrap_or(1.0);
        Self {
            bb: get("bb"),
            stoch_rsi: get("stoch_rsi"),
            macd: get("macd"),
            adx: get("adx"),
            cci: get("cci"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BollingerThresholds {
    /// Fraction of a half-band that splits "near middle" from "near band".
    pub position_threshold: f64,
}

impl Default for BollingerThresholds {
    fn default() -> Self {
        Self {
            position_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StochThresholds {
    pub oversold: f64,
    pub extremely_oversold: f64,
    pub overbought: f64,
    pub extremely_overbought: f64,
    pub midpoint: f64,
}

impl Default for StochThresholds {
    fn default() -> Self {
        Self {
            oversold: 20.0,
            extremely_oversold: 10.0,
            overbought: 80.0,
            extremely_overbought: 90.0,
            midpoint: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MacdThresholds {
    pub hist_moderate: f64,
    pub hist_strong: f64,
}

impl Default for MacdThresholds {
    fn default() -> Self {
        Self {
            hist_moderate: 0.5,
            hist_strong: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AdxThresholds {
    pub weak_trend: f64,
    pub trend: f64,
    pub strong_trend: f64,
    pub very_strong_trend: f64,
}

impl Default for AdxThresholds {
    fn default() -> Self {
        Self {
            weak_trend: 20.0,
            trend: 25.0,
            strong_trend: 40.0,
            very_strong_trend: 50.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CciThresholds {
    pub mildly_bearish: f64,
    pub overbought: f64,
    pub extremely_overbought: f64,
    pub mildly_bullish: f64,
    pub oversold: f64,
    pub extremely_oversold: f64,
    /// CCI outside this band is logged but does not fail validation.
    pub typical_min: f64,
    pub typical_max: f64,
}

impl Default for CciThresholds {
    fn default() -> Self {
        Self {
            mildly_bearish: 50.0,
            overbought: 100.0,
            extremely_overbought: 200.0,
            mildly_bullish: -50.0,
            oversold: -100.0,
            extremely_oversold: -200.0,
            typical_min: -300.0,
            typical_max: 300.0,
        }
    }
}

/// Immutable threshold/weight tables for the whole signal engine.
///
/// Passed explicitly into rating and aggregation calls so behavior stays
/// reproducible and testable with alternate threshold sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalConfig {
    pub weights: IndicatorWeights,
    pub bollinger: BollingerThresholds,
    pub stoch: StochThresholds,
    pub macd: MacdThresholds,
    pub adx: AdxThresholds,
    pub cci: CciThresholds,
}
