use serde::{Deserialize, Serialize};

/// Account risk tier derived from historical performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    UltraConservative,
    Conservative,
    Normal,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::UltraConservative => "ULTRA_CONSERVATIVE",
            RiskLevel::Conservative => "CONSERVATIVE",
            RiskLevel::Normal => "NORMAL",
        }
    }
}

/// Aggregate outcome of one strategy's terminal trades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyStats {
    pub strategy: String,
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percentage in [0, 100].
    pub win_rate: f64,
    pub avg_pnl_percent: f64,
    pub avg_win_percent: Option<f64>,
    pub avg_loss_percent: Option<f64>,
    pub total_pnl_usd: f64,
    pub recommendation: String,
}

/// Aggregate outcome of one symbol's terminal trades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolStats {
    pub symbol: String,
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub avg_pnl_percent: f64,
    pub total_pnl_usd: f64,
    pub recommendation: String,
}

/// Risk-adjustment parameters gating new trades, derived on demand from all
/// terminal trades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountHealth {
    pub total_trades: usize,
    pub win_rate: f64,
    pub total_pnl_percent: f64,
    pub avg_loss_percent: f64,
    pub risk_level: RiskLevel,
    pub max_position_size: f64,
    pub required_risk_reward: f64,
    pub max_stop_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PerformanceTrend {
    Improving,
    Declining,
}

/// Short-window performance summary used for quick adjustments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentPatterns {
    pub trades: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub avg_pnl_percent: f64,
    pub trend: PerformanceTrend,
}

/// A proposed trade, before the adaptive filter has seen it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeOpportunity {
    pub symbol: String,
    pub strategy: Option<String>,
    pub stop_loss_percent: f64,
    pub risk_reward_ratio: f64,
}

/// Historical context attached to an opportunity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpportunityContext {
    pub strategy_history: Option<StrategyStats>,
    pub symbol_history: Option<SymbolStats>,
    /// Additive confidence shift: positive for proven strategies/symbols,
    /// negative for repeat losers.
    pub confidence_adjustment: i32,
}

/// Comprehensive lessons-learned rollup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonsSummary {
    pub account_health: AccountHealth,
    pub recent_performance: Option<RecentPatterns>,
    pub worst_strategies: Vec<StrategyStats>,
    pub best_strategies: Vec<StrategyStats>,
    pub problem_symbols: Vec<SymbolStats>,
    pub strategies_analyzed: usize,
    pub symbols_analyzed: usize,
}
