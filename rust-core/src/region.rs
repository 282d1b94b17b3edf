//! Region normalization: location token -> bucket, plus the high-cost metro set.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Fixed lookup tables for one national geography. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geography {
    pub buckets: BTreeMap<String, Vec<String>>,
    pub high_cost_areas: BTreeSet<String>,
    #[serde(default)]
    pub display_names: BTreeMap<String, String>,
}

impl Geography {
    pub fn india() -> Self {
        let bucket = |name: &str, members: &[&str]| {
            (
                name.to_string(),
                members.iter().map(|m| m.to_string()).collect::<Vec<_>>(),
            )
        };
        let buckets = BTreeMap::from([
            bucket(
                "north",
                &["delhi", "punjab", "haryana", "uttar-pradesh", "uttarakhand", "himachal-pradesh", "jammu-kashmir"],
            ),
            bucket(
                "west",
                &["maharashtra", "gujarat", "rajasthan", "goa", "mumbai", "pune", "ahmedabad"],
            ),
            bucket(
                "south",
                &["karnataka", "tamil-nadu", "kerala", "andhra-pradesh", "telangana", "bangalore", "chennai", "hyderabad"],
            ),
            bucket("east", &["west-bengal", "odisha", "jharkhand", "bihar", "kolkata"]),
            bucket("central", &["madhya-pradesh", "chhattisgarh"]),
            bucket(
                "northeast",
                &["assam", "meghalaya", "tripura", "manipur", "mizoram", "nagaland", "arunachal-pradesh", "sikkim"],
            ),
        ]);
        let high_cost_areas = ["delhi", "mumbai", "bangalore", "chennai", "hyderabad", "pune"]
            .into_iter()
            .map(String::from)
            .collect();
        let display_names = [
            ("delhi", "Delhi NCR"),
            ("mumbai", "Mumbai"),
            ("bangalore", "Bangalore"),
            ("chennai", "Chennai"),
            ("hyderabad", "Hyderabad"),
            ("kolkata", "Kolkata"),
            ("pune", "Pune"),
            ("ahmedabad", "Ahmedabad"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            buckets,
            high_cost_areas,
            display_names,
        }
    }
}

impl Default for Geography {
    fn default() -> Self {
        Self::india()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionBucket {
    /// Bucket name, or the location itself when unmapped.
    pub bucket: String,
    /// Normalized location token stored on entries.
    pub location: String,
}

#[derive(Debug, Clone)]
pub struct RegionalClassifier {
    geography: Geography,
    bucket_of: HashMap<String, String>,
}

impl RegionalClassifier {
    pub fn new(geography: Geography) -> Self {
        let mut bucket_of = HashMap::new();
        for (bucket, members) in &geography.buckets {
            for member in members {
                // BTreeMap order makes the first bucket win for shared members.
                bucket_of
                    .entry(normalize_token(member))
                    .or_insert_with(|| bucket.clone());
            }
        }
        Self {
            geography,
            bucket_of,
        }
    }

    pub fn geography(&self) -> &Geography {
        &self.geography
    }

    pub fn normalize(&self, raw_location: &str) -> RegionBucket {
        let location = normalize_token(raw_location);
        let bucket = self
            .bucket_of
            .get(&location)
            .cloned()
            .unwrap_or_else(|| location.clone());
        RegionBucket { bucket, location }
    }

    pub fn is_high_cost_area(&self, location: &str) -> bool {
        self.geography
            .high_cost_areas
            .contains(&normalize_token(location))
    }

    pub fn display_name(&self, location: &str) -> String {
        self.geography
            .display_names
            .get(location)
            .cloned()
            .unwrap_or_else(|| location.to_string())
    }

    /// Locations belonging to `bucket`; an unknown bucket is its own sole member.
    pub fn members(&self, bucket: &str) -> Vec<String> {
        let bucket = normalize_token(bucket);
        match self.geography.buckets.get(&bucket) {
            Some(members) => members.iter().map(|m| normalize_token(m)).collect(),
            None => vec![bucket],
        }
    }
}

impl Default for RegionalClassifier {
    fn default() -> Self {
        Self::new(Geography::india())
    }
}

/// Lowercase, trimmed, with runs of whitespace, `_` and `-` collapsed to `-`.
pub fn normalize_token(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_known_location() {
        let c = RegionalClassifier::default();
        let r = c.normalize("  Tamil Nadu ");
        assert_eq!(r.location, "tamil-nadu");
        assert_eq!(r.bucket, "south");
        assert_eq!(c.normalize("MUMBAI").bucket, "west");
    }

    #[test]
    fn test_unmapped_location_passes_through() {
        let c = RegionalClassifier::default();
        let r = c.normalize("Port Blair");
        assert_eq!(r.bucket, "port-blair");
        assert_eq!(r.location, "port-blair");
    }

    #[test]
    fn test_high_cost_area_independent_of_bucket() {
        let c = RegionalClassifier::default();
        assert!(c.is_high_cost_area("mumbai"));
        assert!(c.is_high_cost_area("Delhi"));
        assert!(!c.is_high_cost_area("maharashtra"));
        assert!(!c.is_high_cost_area("kolkata"));
    }

    #[test]
    fn test_members_and_display_names() {
        let c = RegionalClassifier::default();
        assert!(c.members("east").contains(&"kolkata".to_string()));
        assert_eq!(c.members("goa-north"), vec!["goa-north".to_string()]);
        assert_eq!(c.display_name("delhi"), "Delhi NCR");
        assert_eq!(c.display_name("kerala"), "kerala");
    }

    #[test]
    fn test_alternate_geography() {
        let geo = Geography {
            buckets: BTreeMap::from([(
                "coast".to_string(),
                vec!["Santa Cruz".to_string()],
            )]),
            high_cost_areas: BTreeSet::from(["santa-cruz".to_string()]),
            display_names: BTreeMap::new(),
        };
        let c = RegionalClassifier::new(geo);
        assert_eq!(c.normalize("santa_cruz").bucket, "coast");
        assert!(c.is_high_cost_area("Santa Cruz"));
        assert!(!c.is_high_cost_area("mumbai"));
    }
}
