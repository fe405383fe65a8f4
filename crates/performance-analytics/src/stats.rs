//! Pure aggregation over terminal trades.
//!
//! Every function here filters to terminal trades itself, takes plain slices
//! and returns derived values; nothing is persisted. The `LessonsAnalyzer`
//! fronts these with store access.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use paper_trader::{PaperTrade, DEFAULT_POSITION_SIZE_USD};

use crate::models::{
    AccountHealth, PerformanceTrend, RecentPatterns, RiskLevel, StrategyStats, SymbolStats,
};

/// Minimum terminal trades before a strategy/symbol group is reported.
pub const MIN_GROUP_TRADES: usize = 3;

/// Default look-back window for `recent_patterns`.
pub const RECENT_WINDOW_DAYS: i64 = 7;

fn pnl_percent(trade: &PaperTrade) -> f64 {
    trade.pnl_percent.unwrap_or(0.0)
}

fn pnl_usd(trade: &PaperTrade) -> f64 {
    trade.pnl_usd.unwrap_or(0.0)
}

fn is_win(trade: &PaperTrade) -> bool {
    pnl_percent(trade) > 0.0
}

fn is_loss(trade: &PaperTrade) -> bool {
    pnl_percent(trade) < 0.0
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn strategy_recommendation(win_rate: f64, avg_pnl: f64) -> String {
    if win_rate >= 60.0 && avg_pnl > 1.0 {
        "EXCELLENT - Prioritize this strategy".to_string()
    } else if win_rate >= 50.0 && avg_pnl > 0.0 {
        "GOOD - Continue using".to_string()
    } else if win_rate >= 40.0 {
        "NEUTRAL - Use with caution".to_string()
    } else {
        "POOR - Avoid this strategy".to_string()
    }
}

fn symbol_recommendation(total_trades: usize, wins: usize, total_pnl: f64) -> String {
    if wins == 0 && total_trades >= MIN_GROUP_TRADES {
        "AVOID - 0% win rate".to_string()
    } else if total_pnl < -50.0 && total_trades >= MIN_GROUP_TRADES {
        "AVOID - Heavy losses".to_string()
    } else if wins as f64 / total_trades as f64 > 0.6 {
        "FAVORABLE - Good track record".to_string()
    } else {
        "NEUTRAL - Mixed results".to_string()
    }
}

/// Win rates and P&L per strategy, over terminal trades carrying a strategy
/// tag. Groups with fewer than `MIN_GROUP_TRADES` trades are omitted.
pub fn strategy_stats(trades: &[PaperTrade]) -> HashMap<String, StrategyStats> {
    let mut groups: HashMap<&str, Vec<&PaperTrade>> = HashMap::new();
    for trade in trades.iter().filter(|t| t.status.is_terminal()) {
        if let Some(strategy) = trade.strategy.as_deref() {
            groups.entry(strategy).or_default().push(trade);
        }
    }

    groups
        .into_iter()
        .filter(|(_, group)| group.len() >= MIN_GROUP_TRADES)
        .map(|(strategy, group)| {
            let total = group.len();
            let wins = group.iter().filter(|t| is_win(t)).count();
            let losses = group.iter().filter(|t| is_loss(t)).count();
            let win_rate = wins as f64 / total as f64 * 100.0;

            let pnls: Vec<f64> = group.iter().map(|t| pnl_percent(t)).collect();
            let win_pnls: Vec<f64> = group
                .iter()
                .filter(|t| is_win(t))
                .map(|t| pnl_percent(t))
                .collect();
            let loss_pnls: Vec<f64> = group
                .iter()
                .filter(|t| is_loss(t))
                .map(|t| pnl_percent(t))
                .collect();

            let avg_pnl = mean(&pnls);
            let stats = StrategyStats {
                strategy: strategy.to_string(),
                total_trades: total,
                wins,
                losses,
                win_rate,
                avg_pnl_percent: avg_pnl,
                avg_win_percent: (!win_pnls.is_empty()).then(|| mean(&win_pnls)),
                avg_loss_percent: (!loss_pnls.is_empty()).then(|| mean(&loss_pnls)),
                total_pnl_usd: group.iter().map(|t| pnl_usd(t)).sum(),
                recommendation: strategy_recommendation(win_rate, avg_pnl),
            };
            (strategy.to_string(), stats)
        })
        .collect()
}

/// Win rates and P&L per symbol, over terminal trades. Groups with fewer
/// than `MIN_GROUP_TRADES` trades are omitted.
pub fn symbol_stats(trades: &[PaperTrade]) -> HashMap<String, SymbolStats> {
    let mut groups: HashMap<&str, Vec<&PaperTrade>> = HashMap::new();
    for trade in trades.iter().filter(|t| t.status.is_terminal()) {
        groups.entry(trade.symbol.as_str()).or_default().push(trade);
    }

    groups
        .into_iter()
        .filter(|(_, group)| group.len() >= MIN_GROUP_TRADES)
        .map(|(symbol, group)| {
            let total = group.len();
            let wins = group.iter().filter(|t| is_win(t)).count();
            let losses = group.iter().filter(|t| is_loss(t)).count();
            let total_pnl: f64 = group.iter().map(|t| pnl_usd(t)).sum();
            let pnls: Vec<f64> = group.iter().map(|t| pnl_percent(t)).collect();

            let stats = SymbolStats {
                symbol: symbol.to_string(),
                total_trades: total,
                wins,
                losses,
                win_rate: wins as f64 / total as f64 * 100.0,
                avg_pnl_percent: mean(&pnls),
                total_pnl_usd: total_pnl,
                recommendation: symbol_recommendation(total, wins, total_pnl),
            };
            (symbol.to_string(), stats)
        })
        .collect()
}

/// Account health over all terminal trades.
///
/// The account-level P&L percentage normalizes total P&L against an assumed
/// stake of `DEFAULT_POSITION_SIZE_USD` per trade. Tier checks run in order:
/// deep drawdown, moderate drawdown, low win rate, healthy. A zero-trade
/// account bootstraps with tight conservative limits.
pub fn account_health(trades: &[PaperTrade]) -> AccountHealth {
    let terminal: Vec<&PaperTrade> = trades.iter().filter(|t| t.status.is_terminal()).collect();

    if terminal.is_empty() {
        return AccountHealth {
            total_trades: 0,
            win_rate: 0.0,
            total_pnl_percent: 0.0,
            avg_loss_percent: 0.0,
            risk_level: RiskLevel::Conservative,
            max_position_size: 500.0,
            required_risk_reward: 4.0,
            max_stop_percent: 1.0,
        };
    }

    let total = terminal.len();
    let wins = terminal.iter().filter(|t| is_win(t)).count();
    let total_pnl_usd: f64 = terminal.iter().map(|t| pnl_usd(t)).sum();
    let loss_pnls: Vec<f64> = terminal
        .iter()
        .filter(|t| is_loss(t))
        .map(|t| pnl_percent(t))
        .collect();

    let win_rate = wins as f64 / total as f64 * 100.0;
    let total_pnl_percent = total_pnl_usd / (total as f64 * DEFAULT_POSITION_SIZE_USD) * 100.0;

    let (risk_level, max_position_size, required_risk_reward, max_stop_percent) =
        if total_pnl_percent < -20.0 {
            // Significant drawdown
            (RiskLevel::UltraConservative, 500.0, 5.0, 0.75)
        } else if total_pnl_percent < -10.0 {
            // Moderate drawdown
            (RiskLevel::Conservative, 750.0, 4.0, 1.0)
        } else if win_rate < 45.0 {
            // Low win rate
            (RiskLevel::Conservative, 800.0, 3.5, 1.5)
        } else {
            (RiskLevel::Normal, 1000.0, 2.5, 2.0)
        };

    AccountHealth {
        total_trades: total,
        win_rate,
        total_pnl_percent,
        avg_loss_percent: mean(&loss_pnls).abs(),
        risk_level,
        max_position_size,
        required_risk_reward,
        max_stop_percent,
    }
}

/// Terminal trades exiting within the last `days` days. Returns `None` when
/// the window is empty.
pub fn recent_patterns(
    trades: &[PaperTrade],
    days: i64,
    now: DateTime<Utc>,
) -> Option<RecentPatterns> {
    let cutoff = now - Duration::days(days);
    let recent: Vec<&PaperTrade> = trades
        .iter()
        .filter(|t| t.status.is_terminal())
        .filter(|t| t.exit_time.map(|exit| exit >= cutoff).unwrap_or(false))
        .collect();

    if recent.is_empty() {
        return None;
    }

    let total = recent.len();
    let wins = recent.iter().filter(|t| is_win(t)).count();
    let win_rate = wins as f64 / total as f64 * 100.0;
    let pnls: Vec<f64> = recent.iter().map(|t| pnl_percent(t)).collect();

    Some(RecentPatterns {
        trades: total,
        wins,
        win_rate,
        avg_pnl_percent: mean(&pnls),
        trend: if win_rate > 50.0 {
            PerformanceTrend::Improving
        } else {
            PerformanceTrend::Declining
        },
    })
}
