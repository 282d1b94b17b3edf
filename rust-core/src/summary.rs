//! Stable, serializable summary of a classification for UI or API callers.

use crate::models::{ClassificationResult, Direction, EntryStatus, Severity};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSummary {
    pub status: EntryStatus,
    /// `normal` for validated entries; absent for ungraded (low) outliers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<Severity>,
    pub regional_median: u64,
    pub deviation: u64,
    pub interquartile_range: u64,
    pub sample_size: usize,
    pub direction: Direction,
    /// Signed percentage of the cost relative to the regional median.
    pub deviation_pct: i64,
    pub high_cost_area: bool,
    pub message: String,
}

pub fn format(result: &ClassificationResult) -> PriceSummary {
    let grade = match result.status {
        EntryStatus::Flagged => result.severity,
        _ => Some(Severity::Normal),
    };
    PriceSummary {
        status: result.status,
        grade,
        regional_median: result.regional_baseline,
        deviation: result.deviation,
        interquartile_range: result.interquartile_range,
        sample_size: result.sample_size,
        direction: result.direction,
        deviation_pct: result.deviation_pct,
        high_cost_area: result.high_cost_area,
        message: result.message.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: EntryStatus, severity: Option<Severity>, cost: u64) -> ClassificationResult {
        let diff = cost as i64 - 100_000;
        ClassificationResult {
            status,
            regional_baseline: 100_000,
            deviation: cost.abs_diff(100_000),
            interquartile_range: 20_000,
            sample_size: 4,
            severity,
            direction: match diff.signum() {
                1 => Direction::Above,
                -1 => Direction::Below,
                _ => Direction::At,
            },
            deviation_pct: diff / 1_000,
            message: "m".to_string(),
            mean: 100_000,
            lower_bound: 70_000.0,
            upper_bound: 150_000.0,
            region: "patna".to_string(),
            high_cost_area: false,
            cost,
        }
    }

    #[test]
    fn test_validated_is_graded_normal() {
        let s = format(&result(EntryStatus::Validated, None, 100_000));
        assert_eq!(s.grade, Some(Severity::Normal));
        assert_eq!(s.direction, Direction::At);
        assert_eq!(s.deviation_pct, 0);
    }

    #[test]
    fn test_low_outlier_without_severity() {
        let r = result(EntryStatus::Flagged, None, 40_000);
        let s = format(&r);
        assert_eq!(s.grade, None);
        assert_eq!(s.direction, Direction::Below);
        assert_eq!(s.deviation_pct, -60);

        let json = serde_json::to_value(&s).unwrap();
        assert!(json.get("grade").is_none());
        assert_eq!(json["status"], "flagged");
        assert_eq!(json["direction"], "below");
    }

    #[test]
    fn test_direction_comes_from_detector() {
        // Median 100.5 rounds to a baseline of 101 while the cost is still above it.
        let mut r = result(EntryStatus::Validated, None, 101);
        r.regional_baseline = 101;
        r.direction = Direction::Above;
        r.deviation_pct = 0;
        let s = format(&r);
        assert_eq!(s.direction, Direction::Above);
        assert_eq!(s.deviation_pct, 0);
    }

    #[test]
    fn test_does_not_mutate_input() {
        let r = result(EntryStatus::Flagged, Some(Severity::Severe), 300_000);
        let before = r.clone();
        let s = format(&r);
        assert_eq!(r, before);
        assert_eq!(s.grade, Some(Severity::Severe));
        assert_eq!(s.deviation_pct, 200);
    }
}
