use async_trait::async_trait;

use crate::{IndicatorSnapshot, SignalError, SymbolReport};

/// Trait for composite signal engines.
///
/// Implementations are pure; the async surface exists so orchestrators can
/// treat signal engines uniformly with I/O-bound analyzers.
#[async_trait]
pub trait SnapshotAnalyzer: Send + Sync {
    async fn analyze(&self, snapshot: &IndicatorSnapshot) -> Result<SymbolReport, SignalError>;
}
