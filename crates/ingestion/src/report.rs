//! Run outcome reporting
//!
//! Failures are collected per record as batches are acknowledged and surfaced
//! at run end without ever halting ingestion.

use serde::Serialize;
use uuid::Uuid;

/// One record the store rejected, with the store's reported reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedObject {
    pub key: Uuid,
    pub reason: String,
}

/// Ordered accumulation of store-rejected records
#[derive(Debug, Clone, Default, Serialize)]
pub struct FailureReport {
    entries: Vec<FailedObject>,
}

impl FailureReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: Uuid, reason: impl Into<String>) {
        self.entries.push(FailedObject {
            key,
            reason: reason.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[FailedObject] {
        &self.entries
    }

    /// First `n` failures, for operator-facing previews
    pub fn preview(&self, n: usize) -> &[FailedObject] {
        &self.entries[..self.entries.len().min(n)]
    }
}

/// Totals for one completed ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Rows consumed from the source, including skipped and duplicate rows
    pub seen: u64,
    /// Records acknowledged as stored
    pub stored: u64,
    /// Records skipped because their key already existed in the store
    pub duplicates: u64,
    /// Rows the normalizer rejected for a missing required field
    pub skipped: u64,
    pub failures: FailureReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_bounds() {
        let mut report = FailureReport::new();
        for _ in 0..5 {
            report.push(Uuid::new_v4(), "rejected");
        }

        assert_eq!(report.preview(3).len(), 3);
        assert_eq!(report.preview(10).len(), 5);
        assert!(FailureReport::new().preview(3).is_empty());
    }

    #[test]
    fn test_failures_keep_insertion_order() {
        let mut report = FailureReport::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        report.push(first, "a");
        report.push(second, "b");

        let keys: Vec<Uuid> = report.entries().iter().map(|e| e.key).collect();
        assert_eq!(keys, vec![first, second]);
    }
}
