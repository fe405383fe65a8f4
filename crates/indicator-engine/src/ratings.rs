//! Per-indicator rating functions.
//!
//! Each function maps one indicator's raw values to a rating in [-3, 3] and a
//! signal label. Ratings are bearish-positive: a NEGATIVE rating is BULLISH.
//! Mean-reversion and trend indicators share this convention so the composite
//! math in `analyzer` stays consistent; downstream consumers depend on it.

use signal_core::{
    AdxThresholds, BollingerThresholds, CciThresholds, MacdThresholds, Signal, StochThresholds,
    RATING_MAX, RATING_MIN,
};
use tracing::warn;

/// Percentage change from open to close.
pub fn percent_change(open: f64, close: f64) -> f64 {
    if open == 0.0 {
        warn!(open, "invalid open price, reporting 0.0 change");
        return 0.0;
    }
    ((close - open) / open) * 100.0
}

/// Bollinger Band Width: (upper - lower) / middle.
pub fn band_width(middle: f64, upper: f64, lower: f64) -> Option<f64> {
    if middle == 0.0 {
        return None;
    }
    Some((upper - lower) / middle)
}

/// Bollinger Bands rating (mean reversion).
///
/// Price near or above the upper band reads overbought, near or below the
/// lower band oversold. The half-band thresholds split each side into a
/// mild (+/-1), firm (+/-2) and extreme (+/-3) reading.
pub fn bollinger_rating(
    close: f64,
    upper: f64,
    middle: f64,
    lower: f64,
    thresholds: &BollingerThresholds,
) -> (i32, Signal) {
    let upper_half = middle + (upper - middle) * thresholds.position_threshold;
    let lower_half = middle - (middle - lower) * thresholds.position_threshold;

    let rating = if close > upper {
        3
    } else if close > upper_half {
        2
    } else if close > middle {
        1
    } else if close < lower {
        -3
    } else if close < lower_half {
        -2
    } else if close < middle {
        -1
    } else {
        0
    };

    (rating, Signal::from_rating(rating))
}

/// Stochastic RSI rating (momentum oscillator).
///
/// Base rating from the overbought/oversold bands, then a K/D crossover in
/// the right half of the range moves the rating one step toward conviction.
pub fn stoch_rsi_rating(k: f64, d: f64, thresholds: &StochThresholds) -> (i32, Signal) {
    let mut rating = if k < thresholds.extremely_oversold {
        -3
    } else if k < thresholds.oversold {
        -2
    } else if k > thresholds.extremely_overbought {
        3
    } else if k > thresholds.overbought {
        2
    } else {
        0
    };

    if k > d && k < thresholds.midpoint {
        // Bullish crossover in the lower region
        rating = (rating - 1).max(RATING_MIN);
    } else if k < d && k > thresholds.midpoint {
        // Bearish crossover in the upper region
        rating = (rating + 1).min(RATING_MAX);
    }

    (rating, Signal::from_rating(rating))
}

/// MACD rating (trend following with momentum).
///
/// Crossover direction sets the sign, histogram magnitude the conviction.
/// Unlike the other indicators, a weak +/-1 reading here still maps to
/// BUY/SELL rather than NEUTRAL.
pub fn macd_rating(
    macd: f64,
    signal_line: f64,
    histogram: f64,
    thresholds: &MacdThresholds,
) -> (i32, Signal) {
    let rating = if macd > signal_line {
        if histogram > thresholds.hist_strong {
            -3
        } else if histogram > thresholds.hist_moderate {
            -2
        } else {
            -1
        }
    } else if macd < signal_line {
        if histogram < -thresholds.hist_strong {
            3
        } else if histogram < -thresholds.hist_moderate {
            2
        } else {
            1
        }
    } else {
        0
    };

    let signal = match rating {
        r if r <= -3 => Signal::StrongBuy,
        -2 | -1 => Signal::Buy,
        1 | 2 => Signal::Sell,
        r if r >= 3 => Signal::StrongSell,
        _ => Signal::Neutral,
    };

    (rating, signal)
}

/// ADX rating (trend strength), with a 0-1 trend-strength scalar.
///
/// +DI vs -DI picks the direction, the ADX level the conviction.
pub fn adx_rating(
    adx: f64,
    plus_di: f64,
    minus_di: f64,
    thresholds: &AdxThresholds,
) -> (i32, Signal, f64) {
    let trend_strength = if adx > thresholds.very_strong_trend {
        1.0
    } else if adx > thresholds.strong_trend {
        0.85
    } else if adx > thresholds.trend {
        0.7
    } else if adx > thresholds.weak_trend {
        0.4
    } else {
        0.2
    };

    let rating = if plus_di > minus_di {
        if adx > thresholds.strong_trend {
            -3
        } else if adx > thresholds.trend {
            -2
        } else {
            -1
        }
    } else if minus_di > plus_di {
        if adx > thresholds.strong_trend {
            3
        } else if adx > thresholds.trend {
            2
        } else {
            1
        }
    } else {
        0
    };

    (rating, Signal::from_rating(rating), trend_strength)
}

/// CCI rating (mean reversion oscillator).
pub fn cci_rating(cci: f64, thresholds: &CciThresholds) -> (i32, Signal) {
    let rating = if cci > thresholds.extremely_overbought {
        3
    } else if cci > thresholds.overbought {
        2
    } else if cci > thresholds.mildly_bearish {
        1
    } else if cci < thresholds.extremely_oversold {
        -3
    } else if cci < thresholds.oversold {
        -2
    } else if cci < thresholds.mildly_bullish {
        -1
    } else {
        0
    };

    (rating, Signal::from_rating(rating))
}
