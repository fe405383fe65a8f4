use thiserror::Error;

#[derive(Error, Debug)]
pub enum TradeError {
    #[error("trade {0} not found")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}
