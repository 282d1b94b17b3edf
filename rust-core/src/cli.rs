//! JSON command handlers behind the `claritycare-anomaly` binary.
//!
//! Every entry read from input has its region normalized before it reaches
//! the ledger or the detector.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::warn;

use crate::analyzer::{PriceAnalyzer, Submission};
use crate::error::{EngineError, ValidationError};
use crate::ledger::PriceLedger;
use crate::market::{ledger_stats, market_report, recent_history, HistoryFilter, LedgerStats, MarketReport};
use crate::models::{ClassificationResult, NewEntry, PriceEntry};
use crate::region::RegionalClassifier;
use crate::summary::{self, PriceSummary};

// --- Classify structs ---

#[derive(Debug, Deserialize)]
struct ClassifyInput {
    candidate: PriceEntry,
    #[serde(default)]
    history: Vec<PriceEntry>,
}

#[derive(Debug, Serialize)]
struct ClassifyOutput {
    result: ClassificationResult,
    summary: PriceSummary,
}

// --- Ledger structs ---

#[derive(Debug, Deserialize)]
struct SubmitInput {
    entries: Option<Vec<PriceEntry>>,
    entry: NewEntry,
}

#[derive(Debug, Serialize)]
struct SubmitOutput {
    submission: Submission,
    stats: LedgerStats,
}

#[derive(Debug, Deserialize)]
struct MarketInput {
    entries: Option<Vec<PriceEntry>>,
    procedure: String,
    bucket: Option<String>,
}

#[derive(Debug, Serialize)]
struct MarketOutput {
    report: MarketReport,
}

#[derive(Debug, Deserialize)]
struct HistoryInput {
    entries: Option<Vec<PriceEntry>>,
    #[serde(default = "default_filter")]
    filter: HistoryFilter,
}

fn default_filter() -> HistoryFilter {
    HistoryFilter::All
}

#[derive(Debug, Serialize)]
struct HistoryOutput {
    entries: Vec<PriceEntry>,
}

#[derive(Debug, Deserialize)]
struct StatsInput {
    entries: Option<Vec<PriceEntry>>,
}

// --- Region structs ---

#[derive(Debug, Deserialize)]
struct RegionInput {
    location: String,
}

#[derive(Debug, Serialize)]
struct RegionOutput {
    bucket: String,
    location: String,
    display_name: String,
    high_cost_area: bool,
}

fn normalize_regions(entries: Vec<PriceEntry>, regions: &RegionalClassifier) -> Vec<PriceEntry> {
    entries
        .into_iter()
        .map(|mut e| {
            e.region = regions.normalize(&e.region).location;
            e
        })
        .collect()
}

fn ledger_from(entries: Vec<PriceEntry>, regions: &RegionalClassifier) -> PriceLedger {
    let (ledger, rejected) = PriceLedger::from_entries(normalize_regions(entries, regions));
    for e in rejected {
        warn!(error = %e, "skipping stored entry");
    }
    ledger
}

/// Omitted `entries` fall back to the demo ledger.
fn load_ledger(entries: Option<Vec<PriceEntry>>, regions: &RegionalClassifier) -> PriceLedger {
    match entries {
        Some(entries) => ledger_from(entries, regions),
        None => PriceLedger::with_demo_entries(),
    }
}

/// Runs one command, reading its JSON input and writing its JSON output.
/// Unknown commands run `classify`.
pub fn run(
    cmd: &str,
    analyzer: &PriceAnalyzer,
    input: impl Read,
    output: impl Write,
) -> Result<(), EngineError> {
    let regions = analyzer.regions();
    match cmd {
        "submit" => {
            let input: SubmitInput = serde_json::from_reader(input)?;
            let mut ledger = load_ledger(input.entries, regions);
            let submission = analyzer.submit(&mut ledger, input.entry)?;
            let stats = ledger_stats(ledger.entries());
            serde_json::to_writer(output, &SubmitOutput { submission, stats })?;
        }
        "market" => {
            let input: MarketInput = serde_json::from_reader(input)?;
            let ledger = load_ledger(input.entries, regions);
            let report = market_report(
                ledger.entries(),
                &input.procedure,
                input.bucket.as_deref(),
                regions,
            )?;
            serde_json::to_writer(output, &MarketOutput { report })?;
        }
        "history" => {
            let input: HistoryInput = serde_json::from_reader(input)?;
            let ledger = load_ledger(input.entries, regions);
            let entries = recent_history(ledger.entries(), &input.filter, regions);
            serde_json::to_writer(output, &HistoryOutput { entries })?;
        }
        "stats" => {
            let input: StatsInput = serde_json::from_reader(input)?;
            let ledger = load_ledger(input.entries, regions);
            serde_json::to_writer(output, &ledger_stats(ledger.entries()))?;
        }
        "region" => {
            let input: RegionInput = serde_json::from_reader(input)?;
            let bucket = regions.normalize(&input.location);
            serde_json::to_writer(
                output,
                &RegionOutput {
                    display_name: regions.display_name(&bucket.location),
                    high_cost_area: regions.is_high_cost_area(&bucket.location),
                    bucket: bucket.bucket,
                    location: bucket.location,
                },
            )?;
        }
        _ => {
            let input: ClassifyInput = serde_json::from_reader(input)?;
            let mut candidate = input.candidate;
            if candidate.cost == 0 {
                return Err(ValidationError::NonPositiveCost(0).into());
            }
            if candidate.region.trim().is_empty() {
                return Err(ValidationError::MissingField("region").into());
            }
            candidate.region = regions.normalize(&candidate.region).location;
            let history = ledger_from(input.history, regions);
            let result = analyzer.detector().classify(&candidate, history.entries());
            let summary = summary::format(&result);
            serde_json::to_writer(output, &ClassifyOutput { result, summary })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn run_json(cmd: &str, input: Value) -> Result<Value, EngineError> {
        let analyzer = PriceAnalyzer::default();
        let mut out = Vec::new();
        run(cmd, &analyzer, input.to_string().as_bytes(), &mut out)?;
        Ok(serde_json::from_slice(&out)?)
    }

    fn row(id: &str, cost: u64, region: &str) -> Value {
        json!({
            "id": id,
            "procedure_name": "Angioplasty",
            "cost": cost,
            "region": region,
            "timestamp": "2024-03-01",
            "status": "validated"
        })
    }

    #[test]
    fn test_classify_normalizes_history_regions() {
        let out = run_json(
            "classify",
            json!({
                "candidate": {
                    "id": "new", "procedure_name": "Angioplasty", "cost": 105000,
                    "region": "patna", "timestamp": "2024-03-02", "status": "pending"
                },
                "history": [
                    row("a", 100_000, "Patna"),
                    row("b", 110_000, " PATNA "),
                    row("c", 400_000, "delhi"),
                    row("d", 420_000, "Delhi"),
                ]
            }),
        )
        .unwrap();
        assert_eq!(out["result"]["sample_size"], 2);
        assert_eq!(out["result"]["regional_baseline"], 105_000);
        assert_eq!(out["summary"]["status"], "validated");
        assert_eq!(out["summary"]["grade"], "normal");
    }

    #[test]
    fn test_classify_skips_zero_cost_history() {
        let out = run_json(
            "classify",
            json!({
                "candidate": {
                    "id": "new", "procedure_name": "Angioplasty", "cost": 105000,
                    "region": "patna", "timestamp": "2024-03-02", "status": "pending"
                },
                "history": [row("a", 0, "patna"), row("b", 0, "patna")]
            }),
        )
        .unwrap();
        assert_eq!(out["result"]["sample_size"], 0);
        assert_eq!(out["result"]["status"], "validated");
    }

    #[test]
    fn test_classify_rejects_zero_cost_candidate() {
        let err = run_json(
            "classify",
            json!({
                "candidate": {
                    "id": "new", "procedure_name": "Angioplasty", "cost": 0,
                    "region": "patna", "timestamp": "2024-03-02", "status": "pending"
                }
            }),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::NonPositiveCost(0))
        ));
    }

    #[test]
    fn test_market_and_history_match_mixed_case_regions() {
        let entries = json!([row("a", 100_000, "Kolkata"), row("b", 120_000, "ODISHA")]);

        let market = run_json(
            "market",
            json!({"entries": entries.clone(), "procedure": "Angioplasty", "bucket": "east"}),
        )
        .unwrap();
        assert_eq!(market["report"]["count"], 2);
        assert_eq!(market["report"]["overall_average"], 110_000);

        let history = run_json("history", json!({"entries": entries, "filter": "east"})).unwrap();
        assert_eq!(history["entries"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_submit_against_demo_ledger() {
        let out = run_json(
            "submit",
            json!({"entry": {
                "hospital_name": "Fortis", "procedure_name": "Gallstone Surgery",
                "cost": 450000, "region": "Mumbai"
            }}),
        )
        .unwrap();
        assert_eq!(out["submission"]["entry"]["status"], "flagged");
        assert_eq!(out["submission"]["summary"]["grade"], "severe");
        assert_eq!(out["stats"]["total_entries"], 9);
    }

    #[test]
    fn test_region_and_stats_commands() {
        let region = run_json("region", json!({"location": "Tamil Nadu"})).unwrap();
        assert_eq!(region["bucket"], "south");
        assert_eq!(region["location"], "tamil-nadu");
        assert_eq!(region["high_cost_area"], false);

        let stats = run_json("stats", json!({})).unwrap();
        assert_eq!(stats["total_entries"], 8);
        assert_eq!(stats["avg_savings"], 70_333);
    }

    #[test]
    fn test_bad_timestamp_is_an_error() {
        let err = run_json(
            "stats",
            json!({"entries": [{
                "id": "a", "procedure_name": "MRI", "cost": 5000, "region": "pune",
                "timestamp": "2024-01-1é", "status": "validated"
            }]}),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Json(_)));
    }
}
