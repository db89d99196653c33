//! Cross-revision signature tracking.

use crate::model::{SignatureRecord, Snapshot};
use std::collections::{BTreeMap, HashMap};

/// Signature history of every function seen so far.
///
/// Revisions must be fed in processing order. A change is recorded when a
/// function's signature differs from the last one this tracker saw for it,
/// even if the function was absent from the revisions in between.
#[derive(Debug, Default, Clone)]
pub struct SignatureHistory {
    records: BTreeMap<String, SignatureRecord>,
    last_seen: HashMap<String, String>,
}

impl SignatureHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one revision's functions into the history.
    pub fn record(&mut self, revision: &str, snapshot: &Snapshot) {
        for (name, func) in &snapshot.functions {
            let entry = self.records.entry(name.clone()).or_default();
            if let Some(last) = self.last_seen.get(name) {
                if *last != func.sig {
                    entry.changes.insert(revision.to_string());
                }
            }
            entry.exists.push(revision.to_string());
            self.last_seen.insert(name.clone(), func.sig.clone());
        }
    }

    pub fn get(&self, function: &str) -> Option<&SignatureRecord> {
        self.records.get(function)
    }

    /// Functions whose signature changed at `revision`, sorted.
    pub fn changed_at(&self, revision: &str) -> Vec<&str> {
        self.records
            .iter()
            .filter(|(_, rec)| rec.changes.contains(revision))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn records(&self) -> &BTreeMap<String, SignatureRecord> {
        &self.records
    }

    pub fn into_records(self) -> BTreeMap<String, SignatureRecord> {
        self.records
    }
}
