//! ClarityCare core: regional price-anomaly detection for submitted procedure costs.
//! Pure classification over in-memory snapshots; storage sits behind `EntryStore`.

mod analyzer;
mod anomaly;
pub mod cli;
mod config;
mod error;
mod ledger;
pub mod logging;
mod market;
mod models;
mod region;
pub mod summary;

pub use analyzer::{PriceAnalyzer, Submission};
pub use anomaly::{AnomalyDetector, CostStats, DetectorConfig};
pub use config::{EngineConfig, CONFIG_ENV};
pub use error::{EngineError, StoreError, ValidationError};
pub use ledger::{demo_entries, EntryStore, PriceLedger};
pub use market::{
    ledger_stats, market_report, recent_history, HistoryFilter, LedgerStats, LocationGroup,
    MarketReport, HISTORY_LIMIT,
};
pub use models::{ClassificationResult, Direction, EntryStatus, NewEntry, PriceEntry, Severity};
pub use region::{normalize_token, Geography, RegionBucket, RegionalClassifier};
pub use summary::PriceSummary;
