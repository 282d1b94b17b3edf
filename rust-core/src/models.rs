use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{EngineError, ValidationError};

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
fn deserialize_timestamp<'de, D>(d: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(d)?;
    parse_timestamp(&s).map_err(serde::de::Error::custom)
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d")
        .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
        .map_err(|e| format!("invalid timestamp {s:?}: {e}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Validated,
    Flagged,
}

/// Outlier grade. Only above-fence outliers carry a tier; `Normal` labels
/// validated entries in summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

/// Where the candidate cost sits relative to the unrounded median.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Above,
    Below,
    At,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Above => "above",
            Direction::Below => "below",
            Direction::At => "at",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hospital_name: String,
    pub procedure_name: String,
    /// Smallest currency unit.
    pub cost: u64,
    pub region: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub status: EntryStatus,
}

impl PriceEntry {
    pub fn is_pending(&self) -> bool {
        self.status == EntryStatus::Pending
    }

    /// Moves a pending entry to its final status. Settled entries are frozen.
    pub fn settle(&mut self, status: EntryStatus) -> Result<(), EngineError> {
        if !self.is_pending() {
            return Err(EngineError::AlreadyClassified(self.id.clone()));
        }
        if status == EntryStatus::Pending {
            return Err(EngineError::InvalidTransition(self.id.clone()));
        }
        self.status = status;
        Ok(())
    }
}

/// A submission as it arrives from the caller, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewEntry {
    #[serde(default)]
    pub hospital_name: String,
    pub procedure_name: String,
    pub cost: i64,
    pub region: String,
}

impl NewEntry {
    /// Rejects malformed input at the boundary so the detector never sees it.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.hospital_name.trim().is_empty() {
            return Err(ValidationError::MissingField("hospital_name"));
        }
        if self.procedure_name.trim().is_empty() {
            return Err(ValidationError::MissingField("procedure_name"));
        }
        if self.region.trim().is_empty() {
            return Err(ValidationError::MissingField("region"));
        }
        if self.cost <= 0 {
            return Err(ValidationError::NonPositiveCost(self.cost));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub status: EntryStatus,
    /// Rounded median of the analysis set.
    pub regional_baseline: u64,
    pub deviation: u64,
    pub interquartile_range: u64,
    pub sample_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    pub direction: Direction,
    /// Signed, rounded percentage of the cost relative to the median.
    pub deviation_pct: i64,
    pub message: String,
    pub mean: u64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub region: String,
    pub high_cost_area: bool,
    /// Candidate cost, kept so the result can be summarized on its own.
    pub cost: u64,
}

impl ClassificationResult {
    pub fn is_flagged(&self) -> bool {
        self.status == EntryStatus::Flagged
    }
}
