use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position size assumed when none is supplied, also the per-trade stake the
/// account-level P&L percentage is normalized against.
pub const DEFAULT_POSITION_SIZE_USD: f64 = 1000.0;

pub const DEFAULT_TIMEFRAME: &str = "1h";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeSide {
    Long,
    Short,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Long => "LONG",
            TradeSide::Short => "SHORT",
        }
    }
}

/// Trade lifecycle status.
///
/// `OPEN -> TP1_HIT -> {TP2_HIT, STOPPED}`; `OPEN -> STOPPED` directly;
/// `CLOSED` is reached only through an explicit manual close. `TP2_HIT`,
/// `STOPPED` and `CLOSED` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    Open,
    Tp1Hit,
    Tp2Hit,
    Stopped,
    Closed,
}

impl TradeStatus {
    /// Terminal trades are immutable; price checks against them are no-ops.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TradeStatus::Tp2Hit | TradeStatus::Stopped | TradeStatus::Closed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Open => "OPEN",
            TradeStatus::Tp1Hit => "TP1_HIT",
            TradeStatus::Tp2Hit => "TP2_HIT",
            TradeStatus::Stopped => "STOPPED",
            TradeStatus::Closed => "CLOSED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    StopLoss,
    Target2,
    ManualClose,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "STOP_LOSS",
            ExitReason::Target2 => "TARGET2",
            ExitReason::ManualClose => "MANUAL_CLOSE",
        }
    }
}

/// A simulated trade. Mutable only through the store's evaluate/close paths
/// until it reaches a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PaperTrade {
    pub id: Option<i64>,
    pub trade_id: String,
    pub symbol: String,
    pub side: TradeSide,
    pub strategy: Option<String>,
    pub timeframe: String,

    pub entry_time: DateTime<Utc>,
    pub entry_price_usd: f64,
    pub entry_price_local: f64,
    pub position_size_usd: f64,

    pub stop_loss_usd: f64,
    pub stop_loss_local: f64,
    pub stop_loss_percent: Option<f64>,
    pub target1_usd: f64,
    pub target1_local: f64,
    pub target1_percent: Option<f64>,
    pub target2_usd: Option<f64>,
    pub target2_local: Option<f64>,
    pub target2_percent: Option<f64>,
    pub risk_reward_ratio: Option<f64>,

    pub status: TradeStatus,

    pub exit_time: Option<DateTime<Utc>>,
    pub exit_price_usd: Option<f64>,
    pub exit_price_local: Option<f64>,
    pub exit_reason: Option<ExitReason>,

    pub pnl_usd: Option<f64>,
    pub pnl_local: Option<f64>,
    pub pnl_percent: Option<f64>,
    /// Best unrealized P&L% seen while the trade was live. Non-decreasing.
    pub max_favorable_excursion: f64,
    /// Worst unrealized P&L% seen while the trade was live. Non-increasing.
    pub max_adverse_excursion: f64,

    pub analysis_snapshot: Option<String>,
    pub rationale: Option<String>,
    pub market_context: Option<String>,
    pub notes: Option<String>,
}

/// Trade creation contract. The store assigns the `trade_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeInput {
    pub symbol: String,
    pub side: TradeSide,
    pub strategy: Option<String>,
    pub timeframe: Option<String>,
    pub entry_price_usd: f64,
    pub entry_price_local: f64,
    pub position_size_usd: Option<f64>,
    pub stop_loss_usd: f64,
    pub stop_loss_local: f64,
    pub stop_loss_percent: Option<f64>,
    pub target1_usd: f64,
    pub target1_local: f64,
    pub target1_percent: Option<f64>,
    pub target2_usd: Option<f64>,
    pub target2_local: Option<f64>,
    pub target2_percent: Option<f64>,
    pub risk_reward_ratio: Option<f64>,
    pub analysis_snapshot: Option<serde_json::Value>,
    pub rationale: Option<String>,
    pub market_context: Option<String>,
}

/// A price in both currency representations at one observation instant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceObservation {
    pub price_usd: f64,
    pub price_local: f64,
    pub observed_at: DateTime<Utc>,
}

impl PriceObservation {
    pub fn new(price_usd: f64, price_local: f64) -> Self {
        Self {
            price_usd,
            price_local,
            observed_at: Utc::now(),
        }
    }

    pub fn at(price_usd: f64, price_local: f64, observed_at: DateTime<Utc>) -> Self {
        Self {
            price_usd,
            price_local,
            observed_at,
        }
    }
}

/// Append-only observation log row, one per evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TradeCheck {
    pub id: Option<i64>,
    pub trade_id: String,
    pub check_time: DateTime<Utc>,
    pub price_usd: f64,
    pub price_local: f64,
    pub unrealized_pnl_percent: f64,
    pub status_at_check: TradeStatus,
}

/// Result of one evaluation pass, returned to the monitoring caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEvaluation {
    pub trade_id: String,
    pub symbol: String,
    pub side: TradeSide,
    pub status: TradeStatus,
    pub entry_price_usd: f64,
    pub current_price_usd: f64,
    pub unrealized_pnl_percent: f64,
    pub stop_loss_usd: f64,
    pub target1_usd: f64,
    pub target2_usd: Option<f64>,
}
