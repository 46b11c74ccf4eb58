//! Generic CSV-to-record parsing shared by the chemical and study importers.

use std::collections::HashSet;
use std::fmt::Debug;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use labinv_types::error::CsvImportError;
use labinv_types::import::ImportReport;

use super::header::{AliasTable, ColumnMap};
use super::sniff;
use super::value::{clean_value, parse_bool, parse_date, parse_int};

/// A record type that can be built from one CSV row.
pub trait CsvRecord: Sized {
    type Field: Copy + PartialEq + Debug + 'static;

    /// Entity name used in messages ("chemical", "study").
    const ENTITY: &'static str;

    fn aliases() -> &'static AliasTable<Self::Field>;

    /// Fields that must be present in the header row, with their
    /// column label for error messages.
    fn required_fields() -> &'static [(Self::Field, &'static str)];

    /// Build a record, or explain why the row is invalid.
    fn from_row(row: &MappedRow<'_, Self::Field>) -> Result<Self, String>;

    /// Case-insensitive identity key for duplicate detection.
    fn key(&self) -> String;
}

/// One CSV row viewed through the column map of its file.
pub struct MappedRow<'a, F> {
    record: &'a StringRecord,
    columns: &'a ColumnMap<F>,
    line: u64,
}

impl<F: Copy + PartialEq + Debug + 'static> MappedRow<'_, F> {
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Cleaned text of `field`, `None` when the column is absent or empty.
    pub fn text(&self, field: F) -> Option<String> {
        let index = self.columns.index_of(field)?;
        self.record.get(index).and_then(clean_value)
    }

    pub fn bool(&self, field: F) -> Option<bool> {
        self.typed(field, "boolean", parse_bool)
    }

    pub fn int(&self, field: F) -> Option<i32> {
        self.typed(field, "integer", parse_int)
    }

    pub fn date(&self, field: F) -> Option<NaiveDate> {
        self.typed(field, "date", parse_date)
    }

    /// Parse a typed cell. Unparseable values are logged and treated as
    /// absent; the row itself is kept.
    fn typed<T>(&self, field: F, kind: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        let raw = self.text(field)?;
        let parsed = parse(&raw);
        if parsed.is_none() {
            tracing::warn!(line = self.line, ?field, value = %raw, kind, "unparseable value ignored");
        }
        parsed
    }

    fn is_blank(&self) -> bool {
        self.record.iter().all(|cell| clean_value(cell).is_none())
    }
}

/// A record and the file line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow<T> {
    pub line: u64,
    pub record: T,
}

/// Records accepted from a file plus the partially filled report.
#[derive(Debug)]
pub struct ParsedCsv<T> {
    pub rows: Vec<ParsedRow<T>>,
    pub report: ImportReport,
}

/// Decode, sniff, and parse `bytes` into records of type `T`.
///
/// Malformed and invalid rows are logged, counted and skipped. Rows whose
/// key repeats an earlier row are dropped (first occurrence wins).
pub fn parse_records<T: CsvRecord>(bytes: &[u8]) -> Result<ParsedCsv<T>, CsvImportError> {
    let text = sniff::decode(bytes)?;
    let delimiter = sniff::detect_delimiter(text);
    let (body, skipped_lines) = sniff::skip_blank_lines(text);
    tracing::debug!(delimiter = %(delimiter as char), entity = T::ENTITY, skipped_lines, "parsing csv");

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| CsvImportError::Parse(e.to_string()))?
        .clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(CsvImportError::MissingHeader);
    }

    let columns = ColumnMap::build(headers.iter(), T::aliases());
    if let Some((_, label)) = T::required_fields()
        .iter()
        .find(|(field, _)| !columns.contains(*field))
    {
        return Err(CsvImportError::MissingColumn(label.to_string()));
    }

    let mut report = ImportReport::default();
    let mut rows = Vec::new();
    let mut seen = HashSet::new();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map(|p| p.line() + skipped_lines).unwrap_or_default();
                tracing::warn!(line, error = %e, "malformed csv row skipped");
                report.total_rows += 1;
                report.invalid_rows += 1;
                report.record_issue(line, format!("malformed row: {e}"));
                continue;
            }
        };
        let line = record
            .position()
            .map(|p| p.line() + skipped_lines)
            .unwrap_or_default();
        let row = MappedRow {
            record: &record,
            columns: &columns,
            line,
        };
        if row.is_blank() {
            continue;
        }
        report.total_rows += 1;

        match T::from_row(&row) {
            Ok(parsed) => {
                if seen.insert(parsed.key()) {
                    rows.push(ParsedRow {
                        line,
                        record: parsed,
                    });
                } else {
                    tracing::debug!(line, key = %parsed.key(), "duplicate row in file skipped");
                    report.skipped_duplicates += 1;
                    report.record_issue(line, format!("duplicate {} '{}'", T::ENTITY, parsed.key()));
                }
            }
            Err(reason) => {
                tracing::warn!(line, %reason, "invalid csv row skipped");
                report.invalid_rows += 1;
                report.record_issue(line, reason);
            }
        }
    }

    if rows.is_empty() {
        return Err(CsvImportError::NoValidRecords(T::ENTITY.to_string()));
    }

    Ok(ParsedCsv { rows, report })
}
