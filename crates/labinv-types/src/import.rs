//! Result types of CSV import and analysis.

use serde::{Deserialize, Serialize};

/// At most this many row issues are kept in a report.
pub const MAX_REPORTED_ISSUES: usize = 50;

/// A data row that was not imported, with its 1-based line number in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowIssue {
    pub line: u64,
    pub reason: String,
}

/// Outcome of a CSV import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Data rows read, excluding the header and blank lines.
    pub total_rows: usize,
    pub imported: usize,
    /// Rows whose key already exists in the database.
    pub skipped_existing: usize,
    /// Rows repeating a key seen earlier in the same file.
    pub skipped_duplicates: usize,
    /// Rows rejected by parsing or validation.
    pub invalid_rows: usize,
    pub issues: Vec<RowIssue>,
    pub message: String,
}

impl ImportReport {
    pub fn record_issue(&mut self, line: u64, reason: impl Into<String>) {
        if self.issues.len() < MAX_REPORTED_ISSUES {
            self.issues.push(RowIssue {
                line,
                reason: reason.into(),
            });
        }
    }

    /// Builds the human-readable summary for `entity` ("chemicals", "studies").
    pub fn summarize(&mut self, entity: &str) {
        let mut message = format!("Imported {} {entity}", self.imported);
        let mut skipped = Vec::new();
        if self.skipped_existing > 0 {
            skipped.push(format!("{} already existing", self.skipped_existing));
        }
        if self.skipped_duplicates > 0 {
            skipped.push(format!("{} duplicate in file", self.skipped_duplicates));
        }
        if self.invalid_rows > 0 {
            skipped.push(format!("{} invalid", self.invalid_rows));
        }
        if !skipped.is_empty() {
            message.push_str(&format!(" (skipped: {})", skipped.join(", ")));
        }
        self.message = message;
    }
}

/// Diagnostic view of an uploaded CSV file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvAnalysis {
    pub file_name: String,
    pub size_bytes: usize,
    pub detected_delimiter: String,
    pub comma_count: usize,
    pub semicolon_count: usize,
    pub tab_count: usize,
    pub pipe_count: usize,
    pub headers: Vec<String>,
    pub normalized_headers: Vec<String>,
    /// Canonical field for each header, `None` when the column is ignored.
    pub mapped_fields: Vec<Option<String>>,
    pub first_row: Vec<String>,
    pub first_row_cleaned: Vec<Option<String>>,
    pub data_rows: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lists_only_nonzero_skips() {
        let mut report = ImportReport {
            imported: 3,
            skipped_existing: 1,
            ..Default::default()
        };
        report.summarize("chemicals");
        assert_eq!(report.message, "Imported 3 chemicals (skipped: 1 already existing)");

        let mut clean = ImportReport {
            imported: 2,
            ..Default::default()
        };
        clean.summarize("studies");
        assert_eq!(clean.message, "Imported 2 studies");
    }

    #[test]
    fn test_issue_list_is_capped() {
        let mut report = ImportReport::default();
        for line in 0..(MAX_REPORTED_ISSUES as u64 + 10) {
            report.record_issue(line, "bad");
        }
        assert_eq!(report.issues.len(), MAX_REPORTED_ISSUES);
    }
}
