//! Conflict detection over a snapshot of binding records.
//!
//! A license key is in conflict when its records carry more than one distinct
//! HWID. Everything here is pure and operates on records already fetched for
//! the current request; nothing is cached between requests.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::server::database::BindingRecord;

/// All records sharing one license key, in snapshot order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseGroup {
    pub license_key: String,
    pub records: Vec<BindingRecord>,
}

/// A license key observed with more than one HWID, with every one of its records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ConflictGroup {
    pub license_key: String,
    pub records: Vec<BindingRecord>,
}

/// Group records by license key.
///
/// Groups appear in the order their key was first seen; records keep their
/// relative order inside each group.
pub fn group_by_license_key(records: Vec<BindingRecord>) -> Vec<LicenseGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<LicenseGroup> = Vec::new();

    for record in records {
        match index.get(&record.license_key) {
            Some(&i) => groups[i].records.push(record),
            None => {
                index.insert(record.license_key.clone(), groups.len());
                groups.push(LicenseGroup {
                    license_key: record.license_key.clone(),
                    records: vec![record],
                });
            }
        }
    }

    groups
}

/// Distinct HWIDs among `records`.
pub fn distinct_hwids(records: &[BindingRecord]) -> BTreeSet<&str> {
    records.iter().map(|r| r.hwid.as_str()).collect()
}

/// Whether `records` carry more than one distinct HWID.
pub fn has_conflict(records: &[BindingRecord]) -> bool {
    distinct_hwids(records).len() > 1
}

/// Every conflicting license key in the snapshot, with all of its records.
pub fn find_conflicts(records: Vec<BindingRecord>) -> Vec<ConflictGroup> {
    group_by_license_key(records)
        .into_iter()
        .filter(|group| has_conflict(&group.records))
        .map(|group| ConflictGroup {
            license_key: group.license_key,
            records: group.records,
        })
        .collect()
}

/// Result of inspecting the full record listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingOutcome {
    /// No license key has more than one HWID; carries the whole listing.
    Clean(Vec<BindingRecord>),
    /// At least one conflict exists. The full listing is withheld, including
    /// records of keys that are not in conflict.
    Conflicted(Vec<ConflictGroup>),
}

impl ListingOutcome {
    pub fn from_snapshot(records: Vec<BindingRecord>) -> Self {
        let conflicts = find_conflicts(records.clone());
        if conflicts.is_empty() {
            ListingOutcome::Clean(records)
        } else {
            ListingOutcome::Conflicted(conflicts)
        }
    }
}

/// Result of inspecting the records for a single license key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// No records exist for the key.
    Missing,
    /// Every record carries the same HWID.
    Bound(Vec<BindingRecord>),
    /// More than one HWID; carries every matched record.
    Conflicted(Vec<BindingRecord>),
}

impl KeyOutcome {
    pub fn from_matches(records: Vec<BindingRecord>) -> Self {
        if records.is_empty() {
            KeyOutcome::Missing
        } else if has_conflict(&records) {
            KeyOutcome::Conflicted(records)
        } else {
            KeyOutcome::Bound(records)
        }
    }
}
