//! IQR based price-anomaly detection with a regional baseline. Pure, no I/O.

use crate::models::{ClassificationResult, Direction, EntryStatus, PriceEntry, Severity};
use crate::region::RegionalClassifier;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Tukey fence width in IQRs.
    pub fence_multiplier: f64,
    /// Upper fence multiplier for high-cost metro areas.
    pub high_cost_multiplier: f64,
    pub severe_excess_pct: f64,
    pub moderate_excess_pct: f64,
    /// Minimum same-region comparables before the regional subset is used.
    pub min_regional_sample: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            fence_multiplier: 1.5,
            high_cost_multiplier: 1.3,
            severe_excess_pct: 50.0,
            moderate_excess_pct: 25.0,
            min_regional_sample: 2,
        }
    }
}

/// Summary statistics over one analysis set.
#[derive(Debug, Clone, PartialEq)]
pub struct CostStats {
    pub n: usize,
    pub mean: f64,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
}

impl CostStats {
    /// Positional quartiles (`sorted[floor(n * p)]`), not interpolated.
    /// Returns None for an empty sample.
    pub fn from_costs(costs: &[u64]) -> Option<Self> {
        if costs.is_empty() {
            return None;
        }
        let mut sorted = costs.to_vec();
        sorted.sort_unstable();
        let n = sorted.len();

        let mean = sorted.iter().map(|&c| c as f64).sum::<f64>() / n as f64;
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] as f64 + sorted[n / 2] as f64) / 2.0
        } else {
            sorted[n / 2] as f64
        };
        let q1 = sorted[n / 4] as f64;
        let q3 = sorted[(n * 3) / 4] as f64;

        Some(Self {
            n,
            mean,
            median,
            q1,
            q3,
            iqr: q3 - q1,
        })
    }

    pub fn fences(&self, multiplier: f64) -> (f64, f64) {
        (self.q1 - multiplier * self.iqr, self.q3 + multiplier * self.iqr)
    }
}

pub struct AnomalyDetector {
    config: DetectorConfig,
    regions: RegionalClassifier,
}

impl AnomalyDetector {
    pub fn new(config: DetectorConfig, regions: RegionalClassifier) -> Self {
        Self { config, regions }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Classify `candidate` against a snapshot of previously settled entries.
    pub fn classify(&self, candidate: &PriceEntry, history: &[PriceEntry]) -> ClassificationResult {
        let high_cost_area = self.regions.is_high_cost_area(&candidate.region);
        let comparable: Vec<&PriceEntry> = history
            .iter()
            .filter(|e| {
                e.procedure_name == candidate.procedure_name
                    && e.id != candidate.id
                    && !e.is_pending()
                    && e.cost > 0
            })
            .collect();

        if comparable.is_empty() {
            return baseline(candidate, high_cost_area);
        }

        let regional: Vec<u64> = comparable
            .iter()
            .filter(|e| e.region == candidate.region)
            .map(|e| e.cost)
            .collect();
        let costs: Vec<u64> = if regional.len() >= self.config.min_regional_sample {
            regional
        } else {
            comparable.iter().map(|e| e.cost).collect()
        };

        let Some(stats) = CostStats::from_costs(&costs) else {
            return baseline(candidate, high_cost_area);
        };
        let (lower_bound, upper_bound) = stats.fences(self.config.fence_multiplier);
        let adjusted_upper = if high_cost_area {
            upper_bound * self.config.high_cost_multiplier
        } else {
            upper_bound
        };

        let cost = candidate.cost as f64;
        let is_outlier = cost < lower_bound || cost > adjusted_upper;
        let deviation = (cost - stats.median).abs();
        let deviation_pct = round_half_up((cost - stats.median) / stats.median * 100.0) as i64;
        let direction = if cost > stats.median {
            Direction::Above
        } else if cost < stats.median {
            Direction::Below
        } else {
            Direction::At
        };
        let severity = if cost > adjusted_upper {
            Some(self.grade(cost, adjusted_upper))
        } else {
            None
        };

        debug!(
            procedure = %candidate.procedure_name,
            region = %candidate.region,
            n = stats.n,
            mean = stats.mean,
            median = stats.median,
            iqr = stats.iqr,
            lower_bound,
            upper_bound = adjusted_upper,
            outlier = is_outlier,
            "price analysis"
        );

        let message = if is_outlier {
            let pct = deviation_pct.abs();
            let direction = direction.as_str();
            match severity {
                Some(s) => format!(
                    "Cost is a {} outlier - {}% {} regional median",
                    s.as_str(),
                    pct,
                    direction
                ),
                None => format!("Cost is an outlier - {}% {} regional median", pct, direction),
            }
        } else {
            format!(
                "Cost is within normal range for {} (median {})",
                candidate.region,
                round_half_up(stats.median)
            )
        };

        ClassificationResult {
            status: if is_outlier {
                EntryStatus::Flagged
            } else {
                EntryStatus::Validated
            },
            regional_baseline: round_half_up(stats.median) as u64,
            deviation: round_half_up(deviation) as u64,
            interquartile_range: round_half_up(stats.iqr) as u64,
            sample_size: stats.n,
            severity,
            direction,
            deviation_pct,
            message,
            mean: round_half_up(stats.mean) as u64,
            lower_bound,
            upper_bound: adjusted_upper,
            region: candidate.region.clone(),
            high_cost_area,
            cost: candidate.cost,
        }
    }

    fn grade(&self, cost: f64, adjusted_upper: f64) -> Severity {
        let excess_pct = (cost - adjusted_upper) / adjusted_upper * 100.0;
        if excess_pct > self.config.severe_excess_pct {
            Severity::Severe
        } else if excess_pct > self.config.moderate_excess_pct {
            Severity::Moderate
        } else {
            Severity::Mild
        }
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default(), RegionalClassifier::default())
    }
}

/// The first observation of a procedure establishes the baseline.
fn baseline(candidate: &PriceEntry, high_cost_area: bool) -> ClassificationResult {
    debug!(
        procedure = %candidate.procedure_name,
        region = %candidate.region,
        "no comparable entries, establishing baseline"
    );
    ClassificationResult {
        status: EntryStatus::Validated,
        regional_baseline: candidate.cost,
        deviation: 0,
        interquartile_range: 0,
        sample_size: 0,
        severity: None,
        direction: Direction::At,
        deviation_pct: 0,
        message: "First entry for this procedure - establishing baseline".to_string(),
        mean: candidate.cost,
        lower_bound: candidate.cost as f64,
        upper_bound: candidate.cost as f64,
        region: candidate.region.clone(),
        high_cost_area,
        cost: candidate.cost,
    }
}

/// Half-up rounding, so -2.5 rounds to -2.
pub(crate) fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}
