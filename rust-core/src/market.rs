//! Read models over the ledger: market comparison, recent history, totals.

use serde::{Deserialize, Serialize};

use crate::anomaly::round_half_up;
use crate::error::EngineError;
use crate::models::{EntryStatus, PriceEntry};
use crate::region::RegionalClassifier;

pub const HISTORY_LIMIT: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HistoryFilter {
    All,
    Flagged,
    Bucket(String),
}

impl From<String> for HistoryFilter {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => HistoryFilter::All,
            "flagged" => HistoryFilter::Flagged,
            other => HistoryFilter::Bucket(other.to_string()),
        }
    }
}

impl From<HistoryFilter> for String {
    fn from(f: HistoryFilter) -> Self {
        match f {
            HistoryFilter::All => "all".to_string(),
            HistoryFilter::Flagged => "flagged".to_string(),
            HistoryFilter::Bucket(b) => b,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationGroup {
    pub location: String,
    pub count: usize,
    pub average: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketReport {
    pub procedure: String,
    pub scope: String,
    /// One group per location display name, in first-seen order.
    pub groups: Vec<LocationGroup>,
    pub overall_average: u64,
    pub min: u64,
    pub max: u64,
    pub count: usize,
}

/// Compare a procedure's costs across locations, optionally within one bucket.
pub fn market_report(
    entries: &[PriceEntry],
    procedure: &str,
    bucket: Option<&str>,
    regions: &RegionalClassifier,
) -> Result<MarketReport, EngineError> {
    let members = bucket.map(|b| regions.members(b));
    let data: Vec<&PriceEntry> = entries
        .iter()
        .filter(|e| e.procedure_name == procedure)
        .filter(|e| members.as_ref().map_or(true, |m| m.contains(&e.region)))
        .collect();

    let scope = bucket.unwrap_or("all").to_string();
    let (Some(min), Some(max)) = (
        data.iter().map(|e| e.cost).min(),
        data.iter().map(|e| e.cost).max(),
    ) else {
        return Err(EngineError::NoMarketData {
            procedure: procedure.to_string(),
            scope,
        });
    };

    let mut sums: Vec<(String, u64, usize)> = Vec::new();
    for e in &data {
        let name = regions.display_name(&e.region);
        match sums.iter().position(|(n, _, _)| *n == name) {
            Some(i) => {
                sums[i].1 += e.cost;
                sums[i].2 += 1;
            }
            None => sums.push((name, e.cost, 1)),
        }
    }
    let groups = sums
        .into_iter()
        .map(|(location, sum, count)| LocationGroup {
            location,
            count,
            average: round_half_up(sum as f64 / count as f64) as u64,
        })
        .collect();

    let total: u64 = data.iter().map(|e| e.cost).sum();
    Ok(MarketReport {
        procedure: procedure.to_string(),
        scope,
        groups,
        overall_average: round_half_up(total as f64 / data.len() as f64) as u64,
        min,
        max,
        count: data.len(),
    })
}

/// Newest entries matching `filter`, at most [`HISTORY_LIMIT`].
pub fn recent_history(
    entries: &[PriceEntry],
    filter: &HistoryFilter,
    regions: &RegionalClassifier,
) -> Vec<PriceEntry> {
    let members = match filter {
        HistoryFilter::Bucket(b) => Some(regions.members(b)),
        _ => None,
    };
    let mut out: Vec<PriceEntry> = entries
        .iter()
        .filter(|e| match filter {
            HistoryFilter::All => true,
            HistoryFilter::Flagged => e.status == EntryStatus::Flagged,
            HistoryFilter::Bucket(_) => members.as_ref().map_or(false, |m| m.contains(&e.region)),
        })
        .cloned()
        .collect();
    out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    out.truncate(HISTORY_LIMIT);
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerStats {
    pub total_entries: usize,
    pub flagged: usize,
    pub validated: usize,
    /// Mean flagged cost minus mean validated cost, when both exist.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_savings: Option<i64>,
}

pub fn ledger_stats(entries: &[PriceEntry]) -> LedgerStats {
    let mean_of = |status: EntryStatus| {
        let costs: Vec<u64> = entries
            .iter()
            .filter(|e| e.status == status)
            .map(|e| e.cost)
            .collect();
        let n = costs.len();
        let mean = (n > 0).then(|| costs.iter().sum::<u64>() as f64 / n as f64);
        (n, mean)
    };
    let (flagged, flagged_mean) = mean_of(EntryStatus::Flagged);
    let (validated, validated_mean) = mean_of(EntryStatus::Validated);

    LedgerStats {
        total_entries: entries.len(),
        flagged,
        validated,
        avg_savings: flagged_mean
            .zip(validated_mean)
            .map(|(f, v)| round_half_up(f - v) as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::demo_entries;

    #[test]
    fn test_market_report_all_regions() {
        let regions = RegionalClassifier::default();
        let r = market_report(&demo_entries(), "Heart Bypass Surgery", None, &regions).unwrap();
        assert_eq!(r.count, 3);
        assert_eq!(r.min, 280_000);
        assert_eq!(r.max, 450_000);
        assert_eq!(r.overall_average, 370_000);
        assert_eq!(r.groups[0].location, "Delhi NCR");
        assert_eq!(r.groups.len(), 3);
    }

    #[test]
    fn test_market_report_bucket_filter() {
        let regions = RegionalClassifier::default();
        let r = market_report(&demo_entries(), "Knee Replacement", Some("south"), &regions).unwrap();
        assert_eq!(r.count, 2);
        assert_eq!(r.overall_average, 130_000);

        let err = market_report(&demo_entries(), "Knee Replacement", Some("east"), &regions);
        assert!(matches!(err, Err(EngineError::NoMarketData { .. })));
    }

    #[test]
    fn test_recent_history_filters_and_orders() {
        let regions = RegionalClassifier::default();
        let flagged = recent_history(&demo_entries(), &HistoryFilter::Flagged, &regions);
        let ids: Vec<_> = flagged.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["demo8", "demo6", "demo2"]);

        let north = recent_history(&demo_entries(), &HistoryFilter::from("north".to_string()), &regions);
        assert_eq!(north.len(), 2);
        assert!(north.iter().all(|e| e.region == "delhi"));
    }

    #[test]
    fn test_recent_history_limit() {
        let regions = RegionalClassifier::default();
        let mut entries = demo_entries();
        entries.extend(demo_entries().into_iter().map(|mut e| {
            e.id.push_str("-copy");
            e
        }));
        assert_eq!(recent_history(&entries, &HistoryFilter::All, &regions).len(), HISTORY_LIMIT);
    }

    #[test]
    fn test_ledger_stats() {
        let stats = ledger_stats(&demo_entries());
        assert_eq!(stats.total_entries, 8);
        assert_eq!(stats.flagged, 3);
        assert_eq!(stats.validated, 5);
        // flagged mean 253333.33, validated mean 183000
        assert_eq!(stats.avg_savings, Some(70_333));
        assert_eq!(ledger_stats(&[]).avg_savings, None);
    }
}
