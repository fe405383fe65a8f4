use async_trait::async_trait;
use rayon::prelude::*;
use signal_core::{
    clamp_rating, AdxReport, BandPosition, BollingerReport, CciReport, CompositeSignal,
    IndicatorReports, IndicatorSnapshot, MacdPosition, MacdReport, OscillatorPosition, Signal,
    SignalBreakdown, SignalConfig, SignalError, SnapshotAnalyzer, StochasticReport, SymbolReport,
    TrendQuality, MIN_VALID_PRICE, OSCILLATOR_MAX, OSCILLATOR_MIN,
};
use tracing::{error, warn};

use crate::ratings::*;

/// Validate a snapshot before any rating runs. Fails closed.
///
/// SMA drift outside the bands and atypical CCI readings are warn-only; every
/// other violation rejects the symbol for this cycle.
pub fn validate(snapshot: &IndicatorSnapshot, config: &SignalConfig) -> Result<(), SignalError> {
    if snapshot.open <= MIN_VALID_PRICE || snapshot.close <= MIN_VALID_PRICE {
        return Err(SignalError::InvalidPrice {
            open: snapshot.open,
            close: snapshot.close,
        });
    }

    if snapshot.bb_upper <= snapshot.bb_lower {
        return Err(SignalError::InvalidBands {
            upper: snapshot.bb_upper,
            lower: snapshot.bb_lower,
        });
    }

    if snapshot.sma20 < snapshot.bb_lower || snapshot.sma20 > snapshot.bb_upper {
        warn!(
            sma20 = snapshot.sma20,
            bb_lower = snapshot.bb_lower,
            bb_upper = snapshot.bb_upper,
            "SMA20 is outside the Bollinger Bands"
        );
    }

    let bounded = [
        ("StochRSI.K", snapshot.stoch_k),
        ("StochRSI.D", snapshot.stoch_d),
        ("ADX", snapshot.adx),
    ];
    for (name, value) in bounded {
        if !(OSCILLATOR_MIN..=OSCILLATOR_MAX).contains(&value) {
            return Err(SignalError::OutOfRange {
                name,
                value,
                min: OSCILLATOR_MIN,
                max: OSCILLATOR_MAX,
            });
        }
    }

    if snapshot.cci < config.cci.typical_min || snapshot.cci > config.cci.typical_max {
        warn!(
            cci = snapshot.cci,
            min = config.cci.typical_min,
            max = config.cci.typical_max,
            "CCI is outside its typical range"
        );
    }

    Ok(())
}

/// Weighted composite of per-indicator `(rating, weight)` pairs.
///
/// Weighted mean, rounded to the nearest integer (ties away from zero),
/// clamped to [-3, 3]. Breakdown counts run over the raw unweighted ratings;
/// ratings are bearish-positive, so a NEGATIVE rating counts as BULLISH.
pub fn composite_signal(ratings: &[(i32, f64)]) -> (i32, Signal, SignalBreakdown) {
    if ratings.is_empty() {
        let breakdown = SignalBreakdown {
            raw_score: 0.0,
            bullish_indicators: 0,
            bearish_indicators: 0,
            neutral_indicators: 0,
            total_indicators: 0,
        };
        return (0, Signal::Neutral, breakdown);
    }

    let weighted_sum: f64 = ratings.iter().map(|(r, w)| *r as f64 * w).sum();
    let total_weight: f64 = ratings.iter().map(|(_, w)| w).sum();
    let raw_score = if total_weight != 0.0 {
        weighted_sum / total_weight
    } else {
        0.0
    };

    let rating = clamp_rating(raw_score.round() as i32);
    let breakdown = SignalBreakdown {
        raw_score,
        bullish_indicators: ratings.iter().filter(|(r, _)| *r < 0).count() as u32,
        bearish_indicators: ratings.iter().filter(|(r, _)| *r > 0).count() as u32,
        neutral_indicators: ratings.iter().filter(|(r, _)| *r == 0).count() as u32,
        total_indicators: ratings.len() as u32,
    };

    (rating, Signal::from_rating(rating), breakdown)
}

/// Composite signal engine: validates a snapshot, rates each indicator, and
/// aggregates the weighted ratings into one signal plus a full report.
pub struct CompositeAnalyzer {
    config: SignalConfig,
}

impl CompositeAnalyzer {
    pub fn new() -> Self {
        Self {
            config: SignalConfig::default(),
        }
    }

    pub fn with_config(config: SignalConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignalConfig {
        &self.config
    }

    pub fn analyze_sync(&self, snapshot: &IndicatorSnapshot) -> Result<SymbolReport, SignalError> {
        validate(snapshot, &self.config)?;

        let cfg = &self.config;
        let s = snapshot;

        let (bb_rating, bb_signal) =
            bollinger_rating(s.close, s.bb_upper, s.sma20, s.bb_lower, &cfg.bollinger);
        let (stoch_rating, stoch_signal) = stoch_rsi_rating(s.stoch_k, s.stoch_d, &cfg.stoch);
        let (macd_rating_value, macd_signal_value) =
            macd_rating(s.macd, s.macd_signal, s.macd_histogram, &cfg.macd);
        let (adx_rating_value, adx_signal_value, trend_strength) =
            adx_rating(s.adx, s.plus_di, s.minus_di, &cfg.adx);
        let (cci_rating_value, cci_signal_value) = cci_rating(s.cci, &cfg.cci);

        let (rating, signal, breakdown) = composite_signal(&[
            (bb_rating, cfg.weights.bb),
            (stoch_rating, cfg.weights.stoch_rsi),
            (macd_rating_value, cfg.weights.macd),
            (adx_rating_value, cfg.weights.adx),
            (cci_rating_value, cfg.weights.cci),
        ]);

        Ok(SymbolReport {
            price: s.close,
            change: percent_change(s.open, s.close),
            composite: CompositeSignal {
                rating,
                signal,
                breakdown,
                trend_strength,
            },
            indicators: IndicatorReports {
                bollinger_bands: BollingerReport {
                    rating: bb_rating,
                    signal: bb_signal,
                    width: band_width(s.sma20, s.bb_upper, s.bb_lower),
                    upper: s.bb_upper,
                    middle: s.sma20,
                    lower: s.bb_lower,
                    position: if s.close > s.bb_upper {
                        BandPosition::AboveUpper
                    } else if s.close < s.bb_lower {
                        BandPosition::BelowLower
                    } else {
                        BandPosition::InRange
                    },
                },
                stochastic_rsi: StochasticReport {
                    rating: stoch_rating,
                    signal: stoch_signal,
                    k: s.stoch_k,
                    d: s.stoch_d,
                    position: if s.stoch_k > cfg.stoch.overbought {
                        OscillatorPosition::Overbought
                    } else if s.stoch_k < cfg.stoch.oversold {
                        OscillatorPosition::Oversold
                    } else {
                        OscillatorPosition::Neutral
                    },
                },
                macd: MacdReport {
                    rating: macd_rating_value,
                    signal: macd_signal_value,
                    value: s.macd,
                    signal_line: s.macd_signal,
                    histogram: s.macd_histogram,
                    position: if s.macd > s.macd_signal {
                        MacdPosition::AboveSignal
                    } else {
                        MacdPosition::BelowSignal
                    },
                },
                adx: AdxReport {
                    rating: adx_rating_value,
                    signal: adx_signal_value,
                    value: s.adx,
                    plus_di: s.plus_di,
                    minus_di: s.minus_di,
                    trend_strength,
                    trend_quality: if s.adx > cfg.adx.trend {
                        TrendQuality::Strong
                    } else {
                        TrendQuality::Weak
                    },
                },
                cci: CciReport {
                    rating: cci_rating_value,
                    signal: cci_signal_value,
                    value: s.cci,
                    position: if s.cci > cfg.cci.overbought {
                        OscillatorPosition::Overbought
                    } else if s.cci < cfg.cci.oversold {
                        OscillatorPosition::Oversold
                    } else {
                        OscillatorPosition::Neutral
                    },
                },
            },
        })
    }

    /// Analyze a batch of symbols in parallel.
    ///
    /// A symbol that fails validation yields `None` and is logged; it never
    /// aborts the rest of the batch.
    pub fn analyze_batch(
        &self,
        snapshots: &[(String, IndicatorSnapshot)],
    ) -> Vec<(String, Option<SymbolReport>)> {
        snapshots
            .par_iter()
            .map(|(symbol, snapshot)| match self.analyze_sync(snapshot) {
                Ok(report) => (symbol.clone(), Some(report)),
                Err(err) => {
                    error!(symbol = %symbol, error = %err, "skipping symbol, snapshot rejected");
                    (symbol.clone(), None)
                }
            })
            .collect()
    }
}

#[async_trait]
impl SnapshotAnalyzer for CompositeAnalyzer {
    async fn analyze(&self, snapshot: &IndicatorSnapshot) -> Result<SymbolReport, SignalError> {
        self.analyze_sync(snapshot)
    }
}

impl Default for CompositeAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
