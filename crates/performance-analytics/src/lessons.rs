use std::cmp::Ordering;
use std::collections::HashMap;

use anyhow::Result;
use chrono::Utc;
use paper_trader::TradeStore;
use tracing::info;

use crate::filter;
use crate::models::{
    AccountHealth, LessonsSummary, OpportunityContext, RecentPatterns, StrategyStats, SymbolStats,
    TradeOpportunity,
};
use crate::stats;

/// Lessons thresholds for the summary rollup.
const WORST_STRATEGY_WIN_RATE: f64 = 40.0;
const BEST_STRATEGY_WIN_RATE: f64 = 55.0;
const SUMMARY_TOP_N: usize = 3;

/// Analyzes trade history to extract actionable lessons.
///
/// All aggregation is delegated to the pure functions in `stats`/`filter`;
/// this type only fetches terminal trades from the store.
pub struct LessonsAnalyzer {
    store: TradeStore,
}

impl LessonsAnalyzer {
    pub fn new(store: TradeStore) -> Self {
        Self { store }
    }

    pub async fn strategy_stats(&self) -> Result<HashMap<String, StrategyStats>> {
        let trades = self.store.terminal_trades().await?;
        Ok(stats::strategy_stats(&trades))
    }

    pub async fn symbol_stats(&self) -> Result<HashMap<String, SymbolStats>> {
        let trades = self.store.terminal_trades().await?;
        Ok(stats::symbol_stats(&trades))
    }

    pub async fn account_health(&self) -> Result<AccountHealth> {
        let trades = self.store.terminal_trades().await?;
        Ok(stats::account_health(&trades))
    }

    pub async fn recent_patterns(&self, days: i64) -> Result<Option<RecentPatterns>> {
        let trades = self.store.terminal_trades().await?;
        Ok(stats::recent_patterns(&trades, days, Utc::now()))
    }

    /// Gate a new opportunity on historical performance.
    ///
    /// Returns the rejection reason, or `None` when the opportunity passes.
    pub async fn should_filter(&self, opportunity: &TradeOpportunity) -> Result<Option<String>> {
        let trades = self.store.terminal_trades().await?;
        let strategies = stats::strategy_stats(&trades);
        let symbols = stats::symbol_stats(&trades);
        let health = stats::account_health(&trades);

        let decision = filter::should_filter(opportunity, &strategies, &symbols, &health);
        if let Some(reason) = &decision {
            info!(symbol = %opportunity.symbol, reason = %reason, "filtered opportunity");
        }
        Ok(decision)
    }

    /// Enrich an opportunity with strategy/symbol history.
    pub async fn opportunity_context(
        &self,
        opportunity: &TradeOpportunity,
    ) -> Result<OpportunityContext> {
        let trades = self.store.terminal_trades().await?;
        let strategies = stats::strategy_stats(&trades);
        let symbols = stats::symbol_stats(&trades);
        Ok(filter::opportunity_context(
            opportunity,
            &strategies,
            &symbols,
        ))
    }

    /// Comprehensive lessons-learned summary.
    pub async fn lessons_summary(&self) -> Result<LessonsSummary> {
        let trades = self.store.terminal_trades().await?;
        let strategies = stats::strategy_stats(&trades);
        let symbols = stats::symbol_stats(&trades);

        let mut worst_strategies: Vec<StrategyStats> = strategies
            .values()
            .filter(|s| s.win_rate < WORST_STRATEGY_WIN_RATE)
            .cloned()
            .collect();
        worst_strategies.sort_by(|a, b| {
            a.win_rate
                .partial_cmp(&b.win_rate)
                .unwrap_or(Ordering::Equal)
        });
        worst_strategies.truncate(SUMMARY_TOP_N);

        let mut best_strategies: Vec<StrategyStats> = strategies
            .values()
            .filter(|s| s.win_rate > BEST_STRATEGY_WIN_RATE)
            .cloned()
            .collect();
        best_strategies.sort_by(|a, b| {
            b.win_rate
                .partial_cmp(&a.win_rate)
                .unwrap_or(Ordering::Equal)
        });
        best_strategies.truncate(SUMMARY_TOP_N);

        let problem_symbols: Vec<SymbolStats> = symbols
            .values()
            .filter(|s| {
                (s.wins == 0 && s.total_trades >= 2)
                    || (s.win_rate < 35.0 && s.total_trades >= 3)
            })
            .cloned()
            .collect();

        Ok(LessonsSummary {
            account_health: stats::account_health(&trades),
            recent_performance: stats::recent_patterns(
                &trades,
                stats::RECENT_WINDOW_DAYS,
                Utc::now(),
            ),
            worst_strategies,
            best_strategies,
            problem_symbols,
            strategies_analyzed: strategies.len(),
            symbols_analyzed: symbols.len(),
        })
    }
}
