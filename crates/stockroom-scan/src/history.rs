//! # Scan History
//!
//! Append-only record of resolved scans, owned by one scan session and
//! dropped with it. Entries are never edited or removed.

use stockroom_core::ScanHistoryEntry;

/// Session-scoped, append-only scan log.
#[derive(Debug, Clone, Default)]
pub struct ScanHistory {
    entries: Vec<ScanHistoryEntry>,
}

impl ScanHistory {
    pub fn new() -> Self {
        ScanHistory::default()
    }

    pub(crate) fn append(&mut self, entry: ScanHistoryEntry) -> &ScanHistoryEntry {
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// Entries in the order they were recorded.
    pub fn entries(&self) -> &[ScanHistoryEntry] {
        &self.entries
    }

    /// Entries with the most recent scan first, as a history panel shows them.
    pub fn newest_first(&self) -> impl Iterator<Item = &ScanHistoryEntry> {
        self.entries.iter().rev()
    }

    pub fn last(&self) -> Option<&ScanHistoryEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use stockroom_core::{ScanOutcome, Symbology};

    fn entry(code: &str, outcome: ScanOutcome) -> ScanHistoryEntry {
        ScanHistoryEntry {
            code: code.to_string(),
            symbology: Symbology::Code128,
            timestamp: Utc::now(),
            outcome,
        }
    }

    #[test]
    fn test_append_keeps_order() {
        let mut history = ScanHistory::new();
        assert!(history.is_empty());

        history.append(entry("A", ScanOutcome::Found));
        let last = history.append(entry("B", ScanOutcome::NotFound));
        assert_eq!(last.code, "B");

        let codes: Vec<&str> = history.entries().iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B"]);

        let newest: Vec<&str> = history.newest_first().map(|e| e.code.as_str()).collect();
        assert_eq!(newest, vec!["B", "A"]);
        assert_eq!(history.len(), 2);
    }
}
