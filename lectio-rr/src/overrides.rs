//! Override Records - trusted per-date corrections
//!
//! The override file is JSON, either an object keyed by ISO date:
//!
//! ```json
//! { "2025-09-07": { "gospelRef": "Lk 14:25-33" } }
//! ```
//!
//! or an array of records carrying a `date` field:
//!
//! ```json
//! [ { "date": "2025-09-07", "gospelRef": "Lk 14:25-33" } ]
//! ```
//!
//! A present key replaces the slot, even when its value is `""`. An absent key
//! leaves the slot alone.

use crate::error::{ResolveError, Result};
use crate::types::Slot;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Partial `slot -> citation` mapping for one date
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRecord {
    #[serde(default)]
    pub first_ref: Option<String>,
    #[serde(default)]
    pub second_ref: Option<String>,
    #[serde(default)]
    pub psalm_ref: Option<String>,
    #[serde(default)]
    pub gospel_ref: Option<String>,
}

impl OverrideRecord {
    /// Override for `slot`, if the record names it
    pub fn get(&self, slot: Slot) -> Option<&str> {
        match slot {
            Slot::First => self.first_ref.as_deref(),
            Slot::Second => self.second_ref.as_deref(),
            Slot::Psalm => self.psalm_ref.as_deref(),
            Slot::Gospel => self.gospel_ref.as_deref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Slot::ALL.iter().all(|slot| self.get(*slot).is_none())
    }
}

#[derive(Deserialize)]
struct DatedRecord {
    date: NaiveDate,
    #[serde(flatten)]
    record: OverrideRecord,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OverrideFile {
    Keyed(HashMap<NaiveDate, OverrideRecord>),
    Listed(Vec<DatedRecord>),
}

/// Immutable set of override records, loaded once per run
#[derive(Debug, Clone, Default)]
pub struct OverrideStore {
    records: HashMap<NaiveDate, OverrideRecord>,
}

impl OverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an override file; a missing or malformed file is an error
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ResolveError::Overrides(format!("cannot read {}: {}", path.display(), e))
        })?;
        let store = Self::from_json_str(&text).map_err(|e| match e {
            ResolveError::Overrides(msg) => {
                ResolveError::Overrides(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        info!(
            "Loaded {} override record(s) from {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    /// Parse either supported JSON shape
    ///
    /// In the array shape a later record for the same date wins.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let file: OverrideFile = serde_json::from_str(text)
            .map_err(|e| ResolveError::Overrides(format!("invalid override JSON: {}", e)))?;

        let records = match file {
            OverrideFile::Keyed(map) => map,
            OverrideFile::Listed(list) => list
                .into_iter()
                .map(|dated| (dated.date, dated.record))
                .collect(),
        };
        Ok(Self { records })
    }

    pub fn insert(&mut self, date: NaiveDate, record: OverrideRecord) {
        self.records.insert(date, record);
    }

    pub fn get(&self, date: NaiveDate) -> Option<&OverrideRecord> {
        self.records.get(&date)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
