use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("db error: {0}")]
    Db(#[from] ledger_db::DbError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Failure reported by a collaborator call.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Conditions that abort a snapshot build.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("individual usage fetch failed: {0}")]
    IndividualUsage(#[source] SourceError),
    #[error("billing period out of range for subscription start {0}")]
    PeriodOutOfRange(DateTime<Utc>),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
