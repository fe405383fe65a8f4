//! Adaptive opportunity filter.
//!
//! Gates new trade opportunities on lessons learned from closed trades.
//! Checks run in a fixed order and short-circuit on the first match.

use std::collections::HashMap;

use crate::models::{
    AccountHealth, OpportunityContext, StrategyStats, SymbolStats, TradeOpportunity,
};

/// Reject threshold: strategy win rate below this over >= 5 trades.
const STRATEGY_MIN_WIN_RATE: f64 = 35.0;
const STRATEGY_MIN_SAMPLE: usize = 5;

/// Reject thresholds for symbols with a losing record.
const SYMBOL_WINLESS_SAMPLE: usize = 3;
const SYMBOL_MIN_WIN_RATE: f64 = 30.0;
const SYMBOL_MIN_SAMPLE: usize = 4;

/// Decide whether an opportunity should be rejected.
///
/// Returns the rejection reason, or `None` when the opportunity passes.
/// Order: strategy record, symbol record, stop width vs account health,
/// risk:reward vs account health; first match wins.
pub fn should_filter(
    opportunity: &TradeOpportunity,
    strategies: &HashMap<String, StrategyStats>,
    symbols: &HashMap<String, SymbolStats>,
    health: &AccountHealth,
) -> Option<String> {
    // Filter 1: strategy with a poor track record
    if let Some(strategy) = opportunity.strategy.as_deref() {
        if let Some(stats) = strategies.get(strategy) {
            if stats.win_rate < STRATEGY_MIN_WIN_RATE && stats.total_trades >= STRATEGY_MIN_SAMPLE
            {
                return Some(format!(
                    "strategy '{}' has only {:.1}% win rate ({}W/{}L)",
                    strategy, stats.win_rate, stats.wins, stats.losses
                ));
            }
        }
    }

    // Filter 2: symbol with poor performance
    if let Some(stats) = symbols.get(&opportunity.symbol.to_uppercase()) {
        if stats.wins == 0 && stats.total_trades >= SYMBOL_WINLESS_SAMPLE {
            return Some(format!(
                "{} has 0 wins in {} trades (total P&L ${:.2})",
                stats.symbol, stats.total_trades, stats.total_pnl_usd
            ));
        }
        if stats.win_rate < SYMBOL_MIN_WIN_RATE && stats.total_trades >= SYMBOL_MIN_SAMPLE {
            return Some(format!(
                "{} has a poor {:.1}% win rate",
                stats.symbol, stats.win_rate
            ));
        }
    }

    // Filter 3: stop loss too wide for current account health
    let stop_percent = opportunity.stop_loss_percent.abs();
    if stop_percent > health.max_stop_percent {
        return Some(format!(
            "stop loss {:.2}% exceeds max {:.2}% for {} risk mode (account at {:.1}%)",
            stop_percent,
            health.max_stop_percent,
            health.risk_level.as_str(),
            health.total_pnl_percent
        ));
    }

    // Filter 4: risk:reward too low for account health
    if opportunity.risk_reward_ratio < health.required_risk_reward {
        return Some(format!(
            "R:R {:.1} below required {:.1} for {} mode",
            opportunity.risk_reward_ratio,
            health.required_risk_reward,
            health.risk_level.as_str()
        ));
    }

    None
}

/// Attach strategy/symbol history to an opportunity and derive a confidence
/// adjustment from it.
pub fn opportunity_context(
    opportunity: &TradeOpportunity,
    strategies: &HashMap<String, StrategyStats>,
    symbols: &HashMap<String, SymbolStats>,
) -> OpportunityContext {
    let mut confidence_adjustment = 0;

    let strategy_history = opportunity
        .strategy
        .as_deref()
        .and_then(|strategy| strategies.get(strategy))
        .cloned();
    if let Some(stats) = &strategy_history {
        if stats.win_rate > 65.0 {
            confidence_adjustment += 1;
        } else if stats.win_rate < 45.0 {
            confidence_adjustment -= 2;
        }
    }

    let symbol_history = symbols.get(&opportunity.symbol.to_uppercase()).cloned();
    if let Some(stats) = &symbol_history {
        if stats.wins == 0 && stats.total_trades >= 2 {
            confidence_adjustment -= 3;
        } else if stats.win_rate > 60.0 {
            confidence_adjustment += 1;
        }
    }

    OpportunityContext {
        strategy_history,
        symbol_history,
        confidence_adjustment,
    }
}
