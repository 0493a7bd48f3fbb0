//! Change-detection ledger for convergence output

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::info;

/// One emitted transition
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    pub at: DateTime<Utc>,
    pub key: String,
    pub value: String,
}

/// Last emitted value per observed entity
///
/// Owned by a single wait call. A value is emitted the first time its key is
/// seen and again only when it differs from the previous emission.
#[derive(Debug, Default)]
pub struct ConvergenceLedger {
    last: HashMap<String, String>,
    entries: Vec<LedgerEntry>,
}

impl ConvergenceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `value` for `key`; returns whether it was emitted
    pub fn observe(&mut self, key: &str, value: &str) -> bool {
        if self.last.get(key).map(String::as_str) == Some(value) {
            return false;
        }

        let entry = LedgerEntry {
            at: Utc::now(),
            key: key.to_string(),
            value: value.to_string(),
        };
        info!(key = %entry.key, value = %entry.value, "{} {}: {}", entry.at, entry.key, entry.value);

        self.last.insert(entry.key.clone(), entry.value.clone());
        self.entries.push(entry);
        true
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Emissions recorded for `key`, oldest first
    pub fn history(&self, key: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.key == key)
            .map(|e| e.value.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
