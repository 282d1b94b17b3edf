use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("cost must be positive, got {0}")]
    NonPositiveCost(i64),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("entry {0} is still pending and cannot be stored")]
    Pending(String),
    #[error("entry {0} has a zero cost")]
    ZeroCost(String),
    #[error("entry {0} already exists")]
    DuplicateId(String),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid submission: {0}")]
    Validation(#[from] ValidationError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("entry {0} has already been classified")]
    AlreadyClassified(String),
    #[error("entry {0} cannot return to pending")]
    InvalidTransition(String),
    #[error("no data for procedure {procedure:?} in {scope}")]
    NoMarketData { procedure: String, scope: String },
    #[error("config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
