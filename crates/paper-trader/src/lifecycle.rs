//! Pure trade lifecycle transition.
//!
//! `evaluate_transition` never touches storage: it maps a trade plus one
//! price observation to the resulting status, P&L, excursion extrema, an
//! optional exit and the check-log row. The store wraps it in a transaction
//! to make the read-transition-write sequence atomic per trade.

use chrono::{DateTime, Utc};

use crate::models::{ExitReason, PaperTrade, PriceObservation, TradeCheck, TradeSide, TradeStatus};

/// Realized exit details computed when a trade closes.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeExit {
    pub reason: ExitReason,
    pub exit_time: DateTime<Utc>,
    pub price_usd: f64,
    pub price_local: f64,
    pub pnl_percent: f64,
    pub pnl_usd: f64,
    pub pnl_local: f64,
}

/// Everything one evaluation decides about a trade.
#[derive(Debug, Clone)]
pub struct TradeTransition {
    pub status: TradeStatus,
    pub pnl_percent: f64,
    pub max_favorable_excursion: f64,
    pub max_adverse_excursion: f64,
    pub exit: Option<TradeExit>,
    pub check: TradeCheck,
}

/// Directional unrealized P&L as a percentage of the entry price.
pub fn unrealized_pnl_percent(side: TradeSide, entry_price: f64, current_price: f64) -> f64 {
    match side {
        TradeSide::Long => (current_price - entry_price) / entry_price * 100.0,
        TradeSide::Short => (entry_price - current_price) / entry_price * 100.0,
    }
}

/// Realize an exit at the observed price.
///
/// `pnl_local` converts through the ratio of the two supplied price
/// representations rather than a separately fetched rate.
pub fn realize_exit(
    trade: &PaperTrade,
    obs: &PriceObservation,
    reason: ExitReason,
    pnl_percent: f64,
) -> TradeExit {
    let pnl_usd = trade.position_size_usd * pnl_percent / 100.0;
    let pnl_local = pnl_usd * (obs.price_local / obs.price_usd);
    TradeExit {
        reason,
        exit_time: obs.observed_at,
        price_usd: obs.price_usd,
        price_local: obs.price_local,
        pnl_percent,
        pnl_usd,
        pnl_local,
    }
}

/// Decide the next state for `trade` given one price observation.
///
/// Ordering: stop-loss beats targets, target2 beats target1, target1 only
/// moves an OPEN trade. Terminal trades pass through untouched, but the
/// observation is still logged (the check history is append-only regardless
/// of terminality).
pub fn evaluate_transition(trade: &PaperTrade, obs: &PriceObservation) -> TradeTransition {
    let pnl_percent = unrealized_pnl_percent(trade.side, trade.entry_price_usd, obs.price_usd);

    let check = |status: TradeStatus| TradeCheck {
        id: None,
        trade_id: trade.trade_id.clone(),
        check_time: obs.observed_at,
        price_usd: obs.price_usd,
        price_local: obs.price_local,
        unrealized_pnl_percent: pnl_percent,
        status_at_check: status,
    };

    if trade.status.is_terminal() {
        return TradeTransition {
            status: trade.status,
            pnl_percent,
            max_favorable_excursion: trade.max_favorable_excursion,
            max_adverse_excursion: trade.max_adverse_excursion,
            exit: None,
            check: check(trade.status),
        };
    }

    let stopped = match trade.side {
        TradeSide::Long => obs.price_usd <= trade.stop_loss_usd,
        TradeSide::Short => obs.price_usd >= trade.stop_loss_usd,
    };
    let target2_hit = trade.target2_usd.is_some_and(|target2| match trade.side {
        TradeSide::Long => obs.price_usd >= target2,
        TradeSide::Short => obs.price_usd <= target2,
    });
    let target1_hit = match trade.side {
        TradeSide::Long => obs.price_usd >= trade.target1_usd,
        TradeSide::Short => obs.price_usd <= trade.target1_usd,
    };

    let (status, exit) = if stopped {
        (
            TradeStatus::Stopped,
            Some(realize_exit(trade, obs, ExitReason::StopLoss, pnl_percent)),
        )
    } else if target2_hit {
        (
            TradeStatus::Tp2Hit,
            Some(realize_exit(trade, obs, ExitReason::Target2, pnl_percent)),
        )
    } else if target1_hit && trade.status == TradeStatus::Open {
        (TradeStatus::Tp1Hit, None)
    } else {
        (trade.status, None)
    };

    TradeTransition {
        status,
        pnl_percent,
        max_favorable_excursion: trade.max_favorable_excursion.max(pnl_percent),
        max_adverse_excursion: trade.max_adverse_excursion.min(pnl_percent),
        exit,
        check: check(status),
    }
}
