use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::error::TradeError;
use crate::lifecycle::{evaluate_transition, realize_exit, unrealized_pnl_percent};
use crate::models::{
    ExitReason, PaperTrade, PriceObservation, TradeCheck, TradeEvaluation, TradeInput, TradeStatus,
    DEFAULT_POSITION_SIZE_USD, DEFAULT_TIMEFRAME,
};

/// SQLite-backed trade store.
///
/// Owns every mutation of a trade between creation and terminal closure. The
/// evaluate and close paths run read-transition-write inside one transaction
/// per `trade_id` so concurrent evaluations cannot overwrite each other's
/// close.
#[derive(Clone)]
pub struct TradeStore {
    pool: SqlitePool,
}

impl TradeStore {
    /// Open (and create if missing) the trade database.
    pub async fn new(database_url: &str) -> Result<Self, TradeError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;

        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), TradeError> {
        let schema = include_str!("../../../schema.sql");

        // Execute schema (split by statement since sqlx doesn't support multiple statements)
        for statement in schema.split(';') {
            let stmt = statement.trim();
            if !stmt.is_empty() {
                sqlx::query(stmt).execute(&self.pool).await?;
            }
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create a new paper trade and return its assigned `trade_id`.
    pub async fn create_trade(&self, input: TradeInput) -> Result<String, TradeError> {
        let entry_time = Utc::now();
        let symbol = input.symbol.to_uppercase();
        let trade_id = format!(
            "{}_{}_{}",
            symbol,
            input.side.as_str(),
            entry_time.format("%Y%m%d_%H%M%S")
        );

        sqlx::query(
            r#"
            INSERT INTO paper_trades (
                trade_id, symbol, side, strategy, timeframe,
                entry_time, entry_price_usd, entry_price_local, position_size_usd,
                stop_loss_usd, stop_loss_local, stop_loss_percent,
                target1_usd, target1_local, target1_percent,
                target2_usd, target2_local, target2_percent,
                risk_reward_ratio, status,
                analysis_snapshot, rationale, market_context
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&trade_id)
        .bind(&symbol)
        .bind(input.side)
        .bind(&input.strategy)
        .bind(input.timeframe.as_deref().unwrap_or(DEFAULT_TIMEFRAME))
        .bind(entry_time)
        .bind(input.entry_price_usd)
        .bind(input.entry_price_local)
        .bind(input.position_size_usd.unwrap_or(DEFAULT_POSITION_SIZE_USD))
        .bind(input.stop_loss_usd)
        .bind(input.stop_loss_local)
        .bind(input.stop_loss_percent)
        .bind(input.target1_usd)
        .bind(input.target1_local)
        .bind(input.target1_percent)
        .bind(input.target2_usd)
        .bind(input.target2_local)
        .bind(input.target2_percent)
        .bind(input.risk_reward_ratio)
        .bind(TradeStatus::Open)
        .bind(input.analysis_snapshot.map(|snapshot| snapshot.to_string()))
        .bind(&input.rationale)
        .bind(&input.market_context)
        .execute(&self.pool)
        .await?;

        info!(trade_id = %trade_id, symbol = %symbol, "created paper trade");
        Ok(trade_id)
    }

    /// Check a trade against the current price, transitioning its status and
    /// appending a check-log row. Atomic per `trade_id`.
    ///
    /// Evaluating a terminal trade is a logged no-op that still appends the
    /// observation to the check history.
    pub async fn evaluate(
        &self,
        trade_id: &str,
        obs: &PriceObservation,
    ) -> Result<TradeEvaluation, TradeError> {
        let mut tx = self.pool.begin().await?;

        let trade: PaperTrade =
            sqlx::query_as("SELECT * FROM paper_trades WHERE trade_id = ?")
                .bind(trade_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| TradeError::NotFound(trade_id.to_string()))?;

        let transition = evaluate_transition(&trade, obs);

        if trade.status.is_terminal() {
            debug!(
                trade_id,
                status = trade.status.as_str(),
                "evaluation of terminal trade is a no-op"
            );
        } else if let Some(exit) = &transition.exit {
            sqlx::query(
                r#"
                UPDATE paper_trades
                SET status = ?,
                    exit_time = ?,
                    exit_price_usd = ?,
                    exit_price_local = ?,
                    exit_reason = ?,
                    pnl_percent = ?,
                    pnl_usd = ?,
                    pnl_local = ?,
                    max_favorable_excursion = ?,
                    max_adverse_excursion = ?
                WHERE trade_id = ?
                "#,
            )
            .bind(transition.status)
            .bind(exit.exit_time)
            .bind(exit.price_usd)
            .bind(exit.price_local)
            .bind(exit.reason)
            .bind(exit.pnl_percent)
            .bind(exit.pnl_usd)
            .bind(exit.pnl_local)
            .bind(transition.max_favorable_excursion)
            .bind(transition.max_adverse_excursion)
            .bind(trade_id)
            .execute(&mut *tx)
            .await?;

            info!(
                trade_id,
                reason = exit.reason.as_str(),
                pnl_percent = exit.pnl_percent,
                "closed paper trade"
            );
        } else {
            sqlx::query(
                r#"
                UPDATE paper_trades
                SET status = ?,
                    max_favorable_excursion = ?,
                    max_adverse_excursion = ?
                WHERE trade_id = ?
                "#,
            )
            .bind(transition.status)
            .bind(transition.max_favorable_excursion)
            .bind(transition.max_adverse_excursion)
            .bind(trade_id)
            .execute(&mut *tx)
            .await?;
        }

        self.append_check(&mut tx, &transition.check).await?;
        tx.commit().await?;

        Ok(TradeEvaluation {
            trade_id: trade.trade_id,
            symbol: trade.symbol,
            side: trade.side,
            status: transition.status,
            entry_price_usd: trade.entry_price_usd,
            current_price_usd: obs.price_usd,
            unrealized_pnl_percent: transition.pnl_percent,
            stop_loss_usd: trade.stop_loss_usd,
            target1_usd: trade.target1_usd,
            target2_usd: trade.target2_usd,
        })
    }

    /// Explicitly close a trade at the observed price.
    ///
    /// Closing an already-terminal trade is a logged no-op returning the
    /// stored row unchanged.
    pub async fn close_manual(
        &self,
        trade_id: &str,
        obs: &PriceObservation,
    ) -> Result<PaperTrade, TradeError> {
        let mut tx = self.pool.begin().await?;

        let trade: PaperTrade =
            sqlx::query_as("SELECT * FROM paper_trades WHERE trade_id = ?")
                .bind(trade_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| TradeError::NotFound(trade_id.to_string()))?;

        if trade.status.is_terminal() {
            debug!(
                trade_id,
                status = trade.status.as_str(),
                "manual close of terminal trade is a no-op"
            );
            return Ok(trade);
        }

        let pnl_percent = unrealized_pnl_percent(trade.side, trade.entry_price_usd, obs.price_usd);
        let exit = realize_exit(&trade, obs, ExitReason::ManualClose, pnl_percent);

        sqlx::query(
            r#"
            UPDATE paper_trades
            SET status = ?,
                exit_time = ?,
                exit_price_usd = ?,
                exit_price_local = ?,
                exit_reason = ?,
                pnl_percent = ?,
                pnl_usd = ?,
                pnl_local = ?
            WHERE trade_id = ?
            "#,
        )
        .bind(TradeStatus::Closed)
        .bind(exit.exit_time)
        .bind(exit.price_usd)
        .bind(exit.price_local)
        .bind(exit.reason)
        .bind(exit.pnl_percent)
        .bind(exit.pnl_usd)
        .bind(exit.pnl_local)
        .bind(trade_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(trade_id, pnl_percent, "manually closed paper trade");

        self.trade_by_id(trade_id)
            .await?
            .ok_or_else(|| TradeError::NotFound(trade_id.to_string()))
    }

    async fn append_check(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        check: &TradeCheck,
    ) -> Result<(), TradeError> {
        sqlx::query(
            r#"
            INSERT INTO trade_checks (
                trade_id, check_time, price_usd, price_local,
                unrealized_pnl_percent, status_at_check
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&check.trade_id)
        .bind(check.check_time)
        .bind(check.price_usd)
        .bind(check.price_local)
        .bind(check.unrealized_pnl_percent)
        .bind(check.status_at_check)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    pub async fn trade_by_id(&self, trade_id: &str) -> Result<Option<PaperTrade>, TradeError> {
        let trade = sqlx::query_as("SELECT * FROM paper_trades WHERE trade_id = ?")
            .bind(trade_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(trade)
    }

    /// Trades still being monitored (OPEN or TP1_HIT), newest first.
    pub async fn open_trades(&self) -> Result<Vec<PaperTrade>, TradeError> {
        let trades = sqlx::query_as(
            r#"
            SELECT * FROM paper_trades
            WHERE status IN ('OPEN', 'TP1_HIT')
            ORDER BY entry_time DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(trades)
    }

    /// Closed trade history, most recent exits first.
    pub async fn trade_history(&self, limit: i64) -> Result<Vec<PaperTrade>, TradeError> {
        let trades = sqlx::query_as(
            r#"
            SELECT * FROM paper_trades
            WHERE status IN ('CLOSED', 'STOPPED', 'TP2_HIT')
            ORDER BY exit_time DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(trades)
    }

    /// All terminal trades, the input to performance analytics.
    pub async fn terminal_trades(&self) -> Result<Vec<PaperTrade>, TradeError> {
        let trades = sqlx::query_as(
            "SELECT * FROM paper_trades WHERE status IN ('CLOSED', 'STOPPED', 'TP2_HIT')",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(trades)
    }

    /// Full check history for one trade, oldest first.
    pub async fn checks_for(&self, trade_id: &str) -> Result<Vec<TradeCheck>, TradeError> {
        let checks = sqlx::query_as(
            "SELECT * FROM trade_checks WHERE trade_id = ? ORDER BY check_time, id",
        )
        .bind(trade_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(checks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TradeSide;

    async fn setup_store() -> TradeStore {
        TradeStore::new("sqlite::memory:").await.unwrap()
    }

    fn long_input() -> TradeInput {
        TradeInput {
            symbol: "btcusdt".to_string(),
            side: TradeSide::Long,
            strategy: Some("breakout".to_string()),
            timeframe: None,
            entry_price_usd: 100.0,
            entry_price_local: 12950.0,
            position_size_usd: None,
            stop_loss_usd: 98.0,
            stop_loss_local: 12691.0,
            stop_loss_percent: Some(2.0),
            target1_usd: 102.0,
            target1_local: 13209.0,
            target1_percent: Some(2.0),
            target2_usd: Some(104.0),
            target2_local: Some(13468.0),
            target2_percent: Some(4.0),
            risk_reward_ratio: Some(2.0),
            analysis_snapshot: None,
            rationale: Some("upper band squeeze".to_string()),
            market_context: None,
        }
    }

    fn obs(price_usd: f64) -> PriceObservation {
        PriceObservation::new(price_usd, price_usd * 129.5)
    }

    #[tokio::test]
    async fn create_and_fetch_trade() {
        let store = setup_store().await;
        let trade_id = store.create_trade(long_input()).await.unwrap();

        assert!(trade_id.starts_with("BTCUSDT_LONG_"));
        let trade = store.trade_by_id(&trade_id).await.unwrap().unwrap();
        assert_eq!(trade.symbol, "BTCUSDT");
        assert_eq!(trade.status, TradeStatus::Open);
        assert_eq!(trade.timeframe, "1h");
        assert_eq!(trade.position_size_usd, DEFAULT_POSITION_SIZE_USD);
        assert_eq!(trade.max_favorable_excursion, 0.0);
    }

    #[tokio::test]
    async fn unknown_trade_is_an_error() {
        let store = setup_store().await;
        let err = store.evaluate("NOPE_LONG_0", &obs(100.0)).await.unwrap_err();
        assert!(matches!(err, TradeError::NotFound(id) if id == "NOPE_LONG_0"));
    }

    #[tokio::test]
    async fn long_trade_walks_through_lifecycle() {
        let store = setup_store().await;
        let trade_id = store.create_trade(long_input()).await.unwrap();

        // 99: still open, -1% unrealized
        let eval = store.evaluate(&trade_id, &obs(99.0)).await.unwrap();
        assert_eq!(eval.status, TradeStatus::Open);
        assert_eq!(eval.unrealized_pnl_percent, -1.0);

        // 103: first target
        let eval = store.evaluate(&trade_id, &obs(103.0)).await.unwrap();
        assert_eq!(eval.status, TradeStatus::Tp1Hit);
        assert_eq!(eval.unrealized_pnl_percent, 3.0);

        // 105: second target closes the trade at +5%
        let eval = store.evaluate(&trade_id, &obs(105.0)).await.unwrap();
        assert_eq!(eval.status, TradeStatus::Tp2Hit);
        assert_eq!(eval.unrealized_pnl_percent, 5.0);

        let trade = store.trade_by_id(&trade_id).await.unwrap().unwrap();
        assert_eq!(trade.status, TradeStatus::Tp2Hit);
        assert_eq!(trade.exit_reason, Some(ExitReason::Target2));
        assert_eq!(trade.pnl_percent, Some(5.0));
        assert_eq!(trade.pnl_usd, Some(50.0));
        assert_eq!(trade.exit_price_usd, Some(105.0));
        assert_eq!(trade.max_favorable_excursion, 5.0);
        assert_eq!(trade.max_adverse_excursion, -1.0);

        let checks = store.checks_for(&trade_id).await.unwrap();
        assert_eq!(checks.len(), 3);
        assert_eq!(checks[0].status_at_check, TradeStatus::Open);
        assert_eq!(checks[2].status_at_check, TradeStatus::Tp2Hit);
    }

    #[tokio::test]
    async fn stop_loss_closes_trade() {
        let store = setup_store().await;
        let trade_id = store.create_trade(long_input()).await.unwrap();

        let eval = store.evaluate(&trade_id, &obs(97.0)).await.unwrap();
        assert_eq!(eval.status, TradeStatus::Stopped);

        let trade = store.trade_by_id(&trade_id).await.unwrap().unwrap();
        assert_eq!(trade.exit_reason, Some(ExitReason::StopLoss));
        assert_eq!(trade.pnl_percent, Some(-3.0));
    }

    #[tokio::test]
    async fn terminal_trade_stays_immutable_but_checks_append() {
        let store = setup_store().await;
        let trade_id = store.create_trade(long_input()).await.unwrap();
        store.evaluate(&trade_id, &obs(97.0)).await.unwrap();

        let closed = store.trade_by_id(&trade_id).await.unwrap().unwrap();

        // A later rally must not reopen or re-close the trade
        let eval = store.evaluate(&trade_id, &obs(110.0)).await.unwrap();
        assert_eq!(eval.status, TradeStatus::Stopped);

        let after = store.trade_by_id(&trade_id).await.unwrap().unwrap();
        assert_eq!(after.status, closed.status);
        assert_eq!(after.exit_price_usd, closed.exit_price_usd);
        assert_eq!(after.pnl_percent, closed.pnl_percent);
        assert_eq!(after.max_favorable_excursion, closed.max_favorable_excursion);

        // The observation itself is still logged
        let checks = store.checks_for(&trade_id).await.unwrap();
        assert_eq!(checks.len(), 2);
        assert_eq!(checks[1].status_at_check, TradeStatus::Stopped);
    }

    #[tokio::test]
    async fn manual_close_realizes_pnl() {
        let store = setup_store().await;
        let trade_id = store.create_trade(long_input()).await.unwrap();

        let trade = store.close_manual(&trade_id, &obs(101.0)).await.unwrap();
        assert_eq!(trade.status, TradeStatus::Closed);
        assert_eq!(trade.exit_reason, Some(ExitReason::ManualClose));
        assert_eq!(trade.pnl_percent, Some(1.0));
        assert_eq!(trade.pnl_usd, Some(10.0));

        // Closing again is a no-op
        let again = store.close_manual(&trade_id, &obs(120.0)).await.unwrap();
        assert_eq!(again.exit_price_usd, trade.exit_price_usd);
    }

    #[tokio::test]
    async fn open_trades_and_history_split_by_status() {
        let store = setup_store().await;

        let open_id = store.create_trade(long_input()).await.unwrap();

        let mut short = long_input();
        short.symbol = "ethusdt".to_string();
        short.side = TradeSide::Short;
        short.stop_loss_usd = 102.0;
        short.target1_usd = 98.0;
        short.target2_usd = Some(96.0);
        let short_id = store.create_trade(short).await.unwrap();
        store.evaluate(&short_id, &obs(103.0)).await.unwrap();

        let open = store.open_trades().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].trade_id, open_id);

        let history = store.trade_history(10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].trade_id, short_id);
        assert_eq!(history[0].status, TradeStatus::Stopped);

        let terminal = store.terminal_trades().await.unwrap();
        assert_eq!(terminal.len(), 1);
    }
}
