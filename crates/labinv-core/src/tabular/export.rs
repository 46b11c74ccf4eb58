//! CSV export writer.

use chrono::{DateTime, NaiveDate, Utc};
use csv::{QuoteStyle, WriterBuilder};
use labinv_types::error::CsvImportError;

/// A record type that can be written as one CSV row.
pub trait CsvExport {
    /// File name stem, e.g. `chemicals` for `chemicals_export_*.csv`.
    const STEM: &'static str;
    const DELIMITER: u8;
    const HEADER: &'static [&'static str];

    fn to_row(&self) -> Vec<String>;
}

/// A rendered export ready for download.
#[derive(Debug, Clone)]
pub struct CsvDownload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Serialize `items` with the header of `T`. Fields are quoted only when
/// they contain the delimiter, quotes, or line breaks.
pub fn write_csv<T: CsvExport>(items: &[T]) -> Result<Vec<u8>, CsvImportError> {
    let mut writer = WriterBuilder::new()
        .delimiter(T::DELIMITER)
        .quote_style(QuoteStyle::Necessary)
        .from_writer(Vec::new());

    writer
        .write_record(T::HEADER)
        .map_err(|e| CsvImportError::Write(e.to_string()))?;
    for item in items {
        writer
            .write_record(item.to_row())
            .map_err(|e| CsvImportError::Write(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| CsvImportError::Write(e.to_string()))
}

/// Download name such as `studies_export_20240315_142501.csv`.
pub fn export_file_name(stem: &str, now: DateTime<Utc>) -> String {
    format!("{stem}_export_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

pub(crate) fn opt_text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

pub(crate) fn opt_date(value: &Option<NaiveDate>) -> String {
    value.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

pub(crate) fn opt_display<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(ToString::to_string).unwrap_or_default()
}
