//! The clinician's working list of chosen codes.

use crate::codes::CodeRecord;
use serde::Serialize;

/// Ordered, code-unique list of selected records.
///
/// Insertion order is preserved. Removing and re-adding a code moves it to the end.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SelectedCodes {
    records: Vec<CodeRecord>,
}

impl SelectedCodes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `record` unless its code is already selected.
    ///
    /// Returns `true` if the list changed.
    pub fn add(&mut self, record: CodeRecord) -> bool {
        if self.contains(&record.code) {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Removes the record at `index`; out-of-range indices are a no-op.
    pub fn remove_at(&mut self, index: usize) -> Option<CodeRecord> {
        (index < self.records.len()).then(|| self.records.remove(index))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.records.iter().any(|r| r.code == code)
    }

    pub fn records(&self) -> &[CodeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// One `code — description` line per record, or `None` when nothing is selected.
    pub fn serialize(&self) -> Option<String> {
        if self.records.is_empty() {
            return None;
        }
        Some(
            self.records
                .iter()
                .map(|r| format!("{} — {}", r.code, r.description))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}
