//! Submission pipeline: validate, normalize, classify, settle, append.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::anomaly::AnomalyDetector;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::ledger::EntryStore;
use crate::models::{ClassificationResult, EntryStatus, NewEntry, PriceEntry};
use crate::region::RegionalClassifier;
use crate::summary::{self, PriceSummary};

#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub entry: PriceEntry,
    pub bucket: String,
    pub result: ClassificationResult,
    pub summary: PriceSummary,
}

pub struct PriceAnalyzer {
    regions: RegionalClassifier,
    detector: AnomalyDetector,
}

impl PriceAnalyzer {
    pub fn new(config: EngineConfig) -> Self {
        let regions = RegionalClassifier::new(config.geography);
        let detector = AnomalyDetector::new(config.detector, regions.clone());
        Self { regions, detector }
    }

    pub fn regions(&self) -> &RegionalClassifier {
        &self.regions
    }

    pub fn detector(&self) -> &AnomalyDetector {
        &self.detector
    }

    pub fn submit<S: EntryStore>(&self, store: &mut S, new: NewEntry) -> Result<Submission, EngineError> {
        if let Err(e) = new.validate() {
            warn!(error = %e, "rejected submission");
            return Err(e.into());
        }

        let region = self.regions.normalize(&new.region);
        let mut entry = PriceEntry {
            id: Uuid::new_v4().to_string(),
            hospital_name: new.hospital_name.trim().to_string(),
            procedure_name: new.procedure_name.trim().to_string(),
            cost: new.cost as u64,
            region: region.location,
            timestamp: Utc::now(),
            status: EntryStatus::Pending,
        };

        let history = store.list_procedure(&entry.procedure_name);
        let result = self.detector.classify(&entry, &history);
        entry.settle(result.status)?;
        store.append(entry.clone())?;

        info!(
            id = %entry.id,
            procedure = %entry.procedure_name,
            region = %entry.region,
            cost = entry.cost,
            status = ?result.status,
            sample_size = result.sample_size,
            "price entry classified"
        );

        Ok(Submission {
            summary: summary::format(&result),
            entry,
            bucket: region.bucket,
            result,
        })
    }
}

impl Default for PriceAnalyzer {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
