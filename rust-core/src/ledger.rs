//! Append-only entry storage. Entries are stored already settled, so a
//! historical classification can never be recomputed in place.

use crate::error::StoreError;
use crate::models::{parse_timestamp, EntryStatus, PriceEntry};
use std::collections::HashSet;

pub trait EntryStore {
    /// Stores a settled entry and returns its id.
    fn append(&mut self, entry: PriceEntry) -> Result<String, StoreError>;

    /// Snapshot of every stored entry, in insertion order.
    fn list_all(&self) -> Vec<PriceEntry>;

    fn list_procedure(&self, procedure_name: &str) -> Vec<PriceEntry> {
        self.list_all()
            .into_iter()
            .filter(|e| e.procedure_name == procedure_name)
            .collect()
    }
}

#[derive(Debug, Default, Clone)]
pub struct PriceLedger {
    entries: Vec<PriceEntry>,
    ids: HashSet<String>,
}

impl PriceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from previously persisted entries, skipping any that
    /// are still pending, zero-cost or duplicated.
    pub fn from_entries(entries: impl IntoIterator<Item = PriceEntry>) -> (Self, Vec<StoreError>) {
        let mut ledger = Self::new();
        let rejected = entries
            .into_iter()
            .filter_map(|e| ledger.append(e).err())
            .collect();
        (ledger, rejected)
    }

    /// Ledger seeded with the community sample shown on first launch.
    pub fn with_demo_entries() -> Self {
        let (ledger, _) = Self::from_entries(demo_entries());
        ledger
    }

    pub fn entries(&self) -> &[PriceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EntryStore for PriceLedger {
    fn append(&mut self, entry: PriceEntry) -> Result<String, StoreError> {
        if entry.is_pending() {
            return Err(StoreError::Pending(entry.id));
        }
        if entry.cost == 0 {
            return Err(StoreError::ZeroCost(entry.id));
        }
        if !self.ids.insert(entry.id.clone()) {
            return Err(StoreError::DuplicateId(entry.id));
        }
        let id = entry.id.clone();
        self.entries.push(entry);
        Ok(id)
    }

    fn list_all(&self) -> Vec<PriceEntry> {
        self.entries.clone()
    }

    fn list_procedure(&self, procedure_name: &str) -> Vec<PriceEntry> {
        self.entries
            .iter()
            .filter(|e| e.procedure_name == procedure_name)
            .cloned()
            .collect()
    }
}

pub fn demo_entries() -> Vec<PriceEntry> {
    let rows = [
        ("demo1", "AIIMS Delhi", "Gallstone Surgery", 85_000, "delhi", "2024-01-15", EntryStatus::Validated),
        ("demo2", "Apollo Hospitals", "Gallstone Surgery", 125_000, "bangalore", "2024-01-16", EntryStatus::Flagged),
        ("demo3", "Fortis Healthcare", "Gallstone Surgery", 95_000, "mumbai", "2024-01-17", EntryStatus::Validated),
        ("demo4", "Max Healthcare", "Heart Bypass Surgery", 380_000, "delhi", "2024-01-18", EntryStatus::Validated),
        ("demo5", "Narayana Health", "Heart Bypass Surgery", 280_000, "bangalore", "2024-01-19", EntryStatus::Validated),
        ("demo6", "Private Clinic", "Heart Bypass Surgery", 450_000, "mumbai", "2024-01-20", EntryStatus::Flagged),
        ("demo7", "Government Hospital", "Knee Replacement", 75_000, "chennai", "2024-01-21", EntryStatus::Validated),
        ("demo8", "Manipal Hospitals", "Knee Replacement", 185_000, "bangalore", "2024-01-22", EntryStatus::Flagged),
    ];
    rows.into_iter()
        .filter_map(|(id, hospital, procedure, cost, region, date, status)| {
            Some(PriceEntry {
                id: id.to_string(),
                hospital_name: hospital.to_string(),
                procedure_name: procedure.to_string(),
                cost,
                region: region.to_string(),
                timestamp: parse_timestamp(date).ok()?,
                status,
            })
        })
        .collect()
}
