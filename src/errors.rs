use thiserror::Error;

/// Errors raised while ingesting, staging or reporting a reconciliation run.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A whole file could not be decoded (detail in the message)
    #[error("Parse failed: {0}")]
    ParseFailed(String),

    /// No strategy is registered for the bank and there is no `DEFAULT` fallback
    #[error("Bank parser for '{0}' not found and no default parser is registered")]
    ParserNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Staging store error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid transaction type: {0}")]
    InvalidTrxType(String),

    /// A pipeline stage failed; the run was aborted at this stage
    #[error("Stage '{stage}' failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<ReconcileError>,
    },

    #[error("Reconciliation run cancelled")]
    Cancelled,
}

impl ReconcileError {
    pub fn stage(stage: &'static str, source: ReconcileError) -> Self {
        ReconcileError::Stage {
            stage,
            source: Box::new(source),
        }
    }
}

impl From<config::ConfigError> for ReconcileError {
    fn from(err: config::ConfigError) -> Self {
        ReconcileError::Config(err.to_string())
    }
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;
