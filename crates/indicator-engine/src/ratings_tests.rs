#[cfg(test)]
mod tests {
    use crate::analyzer::*;
    use crate::ratings::*;
    use signal_core::{IndicatorSnapshot, Signal, SignalConfig, SignalError, SnapshotAnalyzer};

    fn cfg() -> SignalConfig {
        SignalConfig::default()
    }

    // A snapshot that rates 0 on every indicator
    fn neutral_snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            open: 100.0,
            close: 100.0,
            sma20: 100.0,
            bb_upper: 105.0,
            bb_lower: 95.0,
            stoch_k: 50.0,
            stoch_d: 50.0,
            macd: 0.0,
            macd_signal: 0.0,
            macd_histogram: 0.0,
            adx: 15.0,
            plus_di: 20.0,
            minus_di: 20.0,
            cci: 0.0,
        }
    }

    // Scenario from the bullish reference case: open=100 close=102.5,
    // SMA20=101, BB 105/97, StochRSI 15/18, MACD 0.5/0.3/0.2,
    // ADX 35 +DI 30 -DI 15, CCI -150.
    fn bullish_snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            open: 100.0,
            close: 102.5,
            sma20: 101.0,
            bb_upper: 105.0,
            bb_lower: 97.0,
            stoch_k: 15.0,
            stoch_d: 18.0,
            macd: 0.5,
            macd_signal: 0.3,
            macd_histogram: 0.2,
            adx: 35.0,
            plus_di: 30.0,
            minus_di: 15.0,
            cci: -150.0,
        }
    }

    fn bearish_snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            open: 100.0,
            close: 97.5,
            sma20: 99.0,
            bb_upper: 103.0,
            bb_lower: 95.0,
            stoch_k: 85.0,
            stoch_d: 82.0,
            macd: -0.4,
            macd_signal: -0.2,
            macd_histogram: -0.2,
            adx: 32.0,
            plus_di: 12.0,
            minus_di: 28.0,
            cci: 180.0,
        }
    }

    #[test]
    fn bollinger_band_positions() {
        let t = cfg().bollinger;
        // Bands: upper 110, middle 100, lower 90; half thresholds 105 / 95
        assert_eq!(bollinger_rating(111.0, 110.0, 100.0, 90.0, &t).0, 3);
        assert_eq!(bollinger_rating(106.0, 110.0, 100.0, 90.0, &t).0, 2);
        assert_eq!(bollinger_rating(101.0, 110.0, 100.0, 90.0, &t).0, 1);
        assert_eq!(bollinger_rating(100.0, 110.0, 100.0, 90.0, &t).0, 0);
        assert_eq!(bollinger_rating(98.0, 110.0, 100.0, 90.0, &t).0, -1);
        assert_eq!(bollinger_rating(94.0, 110.0, 100.0, 90.0, &t).0, -2);
        assert_eq!(bollinger_rating(89.0, 110.0, 100.0, 90.0, &t).0, -3);
    }

    #[test]
    fn bollinger_weak_ratings_stay_neutral() {
        let t = cfg().bollinger;
        // +/-1 readings deliberately map to NEUTRAL, unlike MACD
        assert_eq!(
            bollinger_rating(101.0, 110.0, 100.0, 90.0, &t).1,
            Signal::Neutral
        );
        assert_eq!(
            bollinger_rating(98.0, 110.0, 100.0, 90.0, &t).1,
            Signal::Neutral
        );
        assert_eq!(
            bollinger_rating(94.0, 110.0, 100.0, 90.0, &t).1,
            Signal::Buy
        );
        assert_eq!(
            bollinger_rating(111.0, 110.0, 100.0, 90.0, &t).1,
            Signal::StrongSell
        );
    }

    #[test]
    fn bollinger_rating_monotone_in_close() {
        let t = cfg().bollinger;
        let mut last = i32::MIN;
        for step in 0..200 {
            let close = 85.0 + step as f64 * 0.2;
            let (rating, _) = bollinger_rating(close, 110.0, 100.0, 90.0, &t);
            assert!(rating >= last, "rating decreased at close={close}");
            last = rating;
        }
    }

    #[test]
    fn stoch_base_bands() {
        let t = cfg().stoch;
        assert_eq!(stoch_rsi_rating(5.0, 5.0, &t).0, -3);
        assert_eq!(stoch_rsi_rating(15.0, 15.0, &t).0, -2);
        assert_eq!(stoch_rsi_rating(50.0, 50.0, &t).0, 0);
        assert_eq!(stoch_rsi_rating(85.0, 85.0, &t).0, 2);
        assert_eq!(stoch_rsi_rating(95.0, 95.0, &t).0, 3);
    }

    #[test]
    fn stoch_crossover_adjusts_one_step() {
        let t = cfg().stoch;
        // Bullish crossover below the midpoint deepens conviction
        assert_eq!(stoch_rsi_rating(15.0, 12.0, &t).0, -3);
        // Floors at -3
        assert_eq!(stoch_rsi_rating(5.0, 3.0, &t).0, -3);
        // Bearish crossover above the midpoint
        assert_eq!(stoch_rsi_rating(85.0, 88.0, &t).0, 3);
        // K above D is not a bearish crossover: no adjustment
        assert_eq!(stoch_rsi_rating(85.0, 82.0, &t).0, 2);
        // Caps at +3
        assert_eq!(stoch_rsi_rating(95.0, 98.0, &t).0, 3);
        // Crossover on the wrong side of the midpoint does nothing
        assert_eq!(stoch_rsi_rating(60.0, 55.0, &t).0, 0);
    }

    #[test]
    fn stoch_signal_tiering() {
        let t = cfg().stoch;
        assert_eq!(stoch_rsi_rating(5.0, 5.0, &t).1, Signal::StrongBuy);
        assert_eq!(stoch_rsi_rating(15.0, 15.0, &t).1, Signal::Buy);
        assert_eq!(stoch_rsi_rating(85.0, 85.0, &t).1, Signal::Sell);
        assert_eq!(stoch_rsi_rating(95.0, 95.0, &t).1, Signal::StrongSell);
    }

    #[test]
    fn macd_bullish_branch() {
        let t = cfg().macd;
        assert_eq!(macd_rating(1.0, 0.5, 1.5, &t), (-3, Signal::StrongBuy));
        assert_eq!(macd_rating(1.0, 0.5, 0.7, &t), (-2, Signal::Buy));
        assert_eq!(macd_rating(1.0, 0.5, 0.2, &t), (-1, Signal::Buy));
    }

    #[test]
    fn macd_bearish_branch() {
        let t = cfg().macd;
        assert_eq!(macd_rating(0.5, 1.0, -1.5, &t), (3, Signal::StrongSell));
        assert_eq!(macd_rating(0.5, 1.0, -0.7, &t), (2, Signal::Sell));
        assert_eq!(macd_rating(0.5, 1.0, -0.2, &t), (1, Signal::Sell));
    }

    #[test]
    fn macd_equal_lines_is_neutral() {
        let t = cfg().macd;
        assert_eq!(macd_rating(0.5, 0.5, 0.0, &t), (0, Signal::Neutral));
    }

    #[test]
    fn adx_direction_and_bands() {
        let t = cfg().adx;
        assert_eq!(adx_rating(45.0, 30.0, 15.0, &t).0, -3);
        assert_eq!(adx_rating(30.0, 30.0, 15.0, &t).0, -2);
        assert_eq!(adx_rating(18.0, 30.0, 15.0, &t).0, -1);
        assert_eq!(adx_rating(45.0, 15.0, 30.0, &t).0, 3);
        assert_eq!(adx_rating(30.0, 15.0, 30.0, &t).0, 2);
        assert_eq!(adx_rating(18.0, 15.0, 30.0, &t).0, 1);
        assert_eq!(adx_rating(45.0, 20.0, 20.0, &t).0, 0);
    }

    #[test]
    fn adx_trend_strength_scalar() {
        let t = cfg().adx;
        assert_eq!(adx_rating(55.0, 30.0, 15.0, &t).2, 1.0);
        assert_eq!(adx_rating(45.0, 30.0, 15.0, &t).2, 0.85);
        assert_eq!(adx_rating(30.0, 30.0, 15.0, &t).2, 0.7);
        assert_eq!(adx_rating(22.0, 30.0, 15.0, &t).2, 0.4);
        assert_eq!(adx_rating(10.0, 30.0, 15.0, &t).2, 0.2);
    }

    #[test]
    fn adx_weak_ratings_stay_neutral() {
        let t = cfg().adx;
        assert_eq!(adx_rating(18.0, 30.0, 15.0, &t).1, Signal::Neutral);
        assert_eq!(adx_rating(18.0, 15.0, 30.0, &t).1, Signal::Neutral);
    }

    #[test]
    fn cci_bands() {
        let t = cfg().cci;
        assert_eq!(cci_rating(250.0, &t), (3, Signal::StrongSell));
        assert_eq!(cci_rating(150.0, &t), (2, Signal::Sell));
        assert_eq!(cci_rating(75.0, &t), (1, Signal::Neutral));
        assert_eq!(cci_rating(0.0, &t), (0, Signal::Neutral));
        assert_eq!(cci_rating(-75.0, &t), (-1, Signal::Neutral));
        assert_eq!(cci_rating(-150.0, &t), (-2, Signal::Buy));
        assert_eq!(cci_rating(-250.0, &t), (-3, Signal::StrongBuy));
    }

    #[test]
    fn percent_change_basic() {
        assert!((percent_change(100.0, 102.5) - 2.5).abs() < 1e-9);
        assert!((percent_change(100.0, 97.5) + 2.5).abs() < 1e-9);
        assert_eq!(percent_change(0.0, 97.5), 0.0);
    }

    #[test]
    fn band_width_basic() {
        let width = band_width(100.0, 110.0, 90.0).unwrap();
        assert!((width - 0.2).abs() < 1e-9);
        assert!(band_width(0.0, 110.0, 90.0).is_none());
    }

    #[test]
    fn composite_rounds_ties_away_from_zero() {
        let (rating, signal, _) = composite_signal(&[(1, 1.0), (2, 1.0)]);
        assert_eq!(rating, 2);
        assert_eq!(signal, Signal::Sell);

        let (rating, signal, _) = composite_signal(&[(-1, 1.0), (-2, 1.0)]);
        assert_eq!(rating, -2);
        assert_eq!(signal, Signal::Buy);
    }

    #[test]
    fn composite_rating_stays_in_bounds() {
        let (rating, signal, _) = composite_signal(&[(3, 1.0), (3, 2.0), (3, 0.5)]);
        assert_eq!(rating, 3);
        assert_eq!(signal, Signal::StrongSell);

        let (rating, _, _) = composite_signal(&[(-3, 1.0), (-3, 1.0)]);
        assert_eq!(rating, -3);
    }

    #[test]
    fn composite_empty_is_neutral() {
        let (rating, signal, breakdown) = composite_signal(&[]);
        assert_eq!(rating, 0);
        assert_eq!(signal, Signal::Neutral);
        assert_eq!(breakdown.total_indicators, 0);
    }

    #[test]
    fn composite_breakdown_counts_raw_ratings() {
        // Negative ratings are bullish
        let (_, _, breakdown) = composite_signal(&[(-2, 1.0), (-1, 1.0), (0, 1.0), (3, 1.0)]);
        assert_eq!(breakdown.bullish_indicators, 2);
        assert_eq!(breakdown.bearish_indicators, 1);
        assert_eq!(breakdown.neutral_indicators, 1);
        assert_eq!(breakdown.total_indicators, 4);
    }

    #[test]
    fn analyze_bullish_scenario() {
        let analyzer = CompositeAnalyzer::new();
        let report = analyzer.analyze_sync(&bullish_snapshot()).unwrap();

        assert_eq!(report.indicators.bollinger_bands.rating, 1);
        assert_eq!(report.indicators.bollinger_bands.signal, Signal::Neutral);
        assert_eq!(report.indicators.stochastic_rsi.rating, -2);
        assert_eq!(report.indicators.stochastic_rsi.signal, Signal::Buy);
        assert_eq!(report.indicators.macd.rating, -1);
        assert_eq!(report.indicators.macd.signal, Signal::Buy);
        assert_eq!(report.indicators.adx.rating, -2);
        assert_eq!(report.indicators.adx.signal, Signal::Buy);
        assert_eq!(report.indicators.cci.rating, -2);
        assert_eq!(report.indicators.cci.signal, Signal::Buy);

        // Composite skews bullish: four of five indicators below zero
        assert!(report.composite.rating < 0);
        assert!((report.composite.breakdown.raw_score - (-1.2)).abs() < 1e-9);
        assert_eq!(report.composite.breakdown.bullish_indicators, 4);
        assert_eq!(report.composite.breakdown.bearish_indicators, 1);
        assert!((report.change - 2.5).abs() < 1e-9);
    }

    #[test]
    fn analyze_bearish_scenario() {
        let analyzer = CompositeAnalyzer::new();
        let report = analyzer.analyze_sync(&bearish_snapshot()).unwrap();

        assert_eq!(report.indicators.bollinger_bands.rating, -1);
        assert_eq!(report.indicators.stochastic_rsi.rating, 2);
        assert_eq!(report.indicators.macd.rating, 1);
        assert_eq!(report.indicators.adx.rating, 2);
        assert_eq!(report.indicators.cci.rating, 2);

        assert!(report.composite.rating > 0);
        assert_eq!(report.composite.breakdown.bearish_indicators, 4);
        assert_eq!(report.composite.breakdown.bullish_indicators, 1);
    }

    #[test]
    fn analyze_neutral_scenario() {
        let analyzer = CompositeAnalyzer::new();
        let report = analyzer.analyze_sync(&neutral_snapshot()).unwrap();

        assert_eq!(report.composite.rating, 0);
        assert_eq!(report.composite.signal, Signal::Neutral);
        assert_eq!(report.composite.breakdown.neutral_indicators, 5);
    }

    #[test]
    fn analyze_is_deterministic() {
        let analyzer = CompositeAnalyzer::new();
        let snapshot = bullish_snapshot();

        let first = serde_json::to_value(analyzer.analyze_sync(&snapshot).unwrap()).unwrap();
        let second = serde_json::to_value(analyzer.analyze_sync(&snapshot).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn validate_rejects_bad_prices() {
        let mut snapshot = neutral_snapshot();
        snapshot.open = 0.0;
        let err = validate(&snapshot, &cfg()).unwrap_err();
        assert!(matches!(err, SignalError::InvalidPrice { .. }));
    }

    #[test]
    fn validate_rejects_inverted_bands() {
        let mut snapshot = neutral_snapshot();
        snapshot.bb_upper = 90.0;
        snapshot.bb_lower = 105.0;
        let err = validate(&snapshot, &cfg()).unwrap_err();
        assert!(matches!(err, SignalError::InvalidBands { .. }));
    }

    #[test]
    fn validate_rejects_out_of_range_oscillators() {
        let mut snapshot = neutral_snapshot();
        snapshot.stoch_k = 105.0;
        let err = validate(&snapshot, &cfg()).unwrap_err();
        assert!(matches!(
            err,
            SignalError::OutOfRange {
                name: "StochRSI.K",
                ..
            }
        ));

        let mut snapshot = neutral_snapshot();
        snapshot.adx = -1.0;
        let err = validate(&snapshot, &cfg()).unwrap_err();
        assert!(matches!(err, SignalError::OutOfRange { name: "ADX", .. }));
    }

    #[test]
    fn validate_accepts_atypical_cci() {
        // Warn-only: a wild CCI must not reject the snapshot
        let mut snapshot = neutral_snapshot();
        snapshot.cci = 450.0;
        assert!(validate(&snapshot, &cfg()).is_ok());
    }

    #[test]
    fn batch_skips_invalid_symbols() {
        let analyzer = CompositeAnalyzer::new();
        let mut bad = neutral_snapshot();
        bad.close = -5.0;

        let results = analyzer.analyze_batch(&[
            ("BTCUSDT".to_string(), bullish_snapshot()),
            ("BADUSDT".to_string(), bad),
            ("ETHUSDT".to_string(), bearish_snapshot()),
        ]);

        assert_eq!(results.len(), 3);
        let by_symbol: std::collections::HashMap<_, _> = results
            .into_iter()
            .map(|(symbol, report)| (symbol, report.is_some()))
            .collect();
        assert!(by_symbol["BTCUSDT"]);
        assert!(!by_symbol["BADUSDT"]);
        assert!(by_symbol["ETHUSDT"]);
    }

    #[tokio::test]
    async fn analyzer_works_behind_the_trait() {
        let analyzer: Box<dyn SnapshotAnalyzer> = Box::new(CompositeAnalyzer::new());
        let report = analyzer.analyze(&bullish_snapshot()).await.unwrap();
        assert!(report.composite.rating < 0);
    }

    #[test]
    fn custom_weights_shift_composite() {
        let mut config = SignalConfig::default();
        // Zero out everything except CCI, which reads -2 in the bullish case
        config.weights.bb = 0.0;
        config.weights.stoch_rsi = 0.0;
        config.weights.macd = 0.0;
        config.weights.adx = 0.0;
        config.weights.cci = 1.0;

        let analyzer = CompositeAnalyzer::with_config(config);
        let report = analyzer.analyze_sync(&bullish_snapshot()).unwrap();
        assert_eq!(report.composite.rating, -2);
        assert_eq!(report.composite.signal, Signal::Buy);
    }
}
