//! CSV import and export engine.
//!
//! One implementation of delimiter sniffing, header aliasing, cell cleaning
//! and typed parsing, shared by chemicals and studies through the
//! [`reader::CsvRecord`] and [`export::CsvExport`] traits.

pub mod chemical;
pub mod export;
pub mod header;
pub mod reader;
pub mod sniff;
pub mod study;
pub mod value;

use csv::ReaderBuilder;
use labinv_types::error::CsvImportError;
use labinv_types::import::CsvAnalysis;

use self::header::{AliasTable, normalize_header};

/// An uploaded file as received from a client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Reject empty files, non-`.csv` names, and files over `max_bytes`.
    pub fn validate(&self, max_bytes: usize) -> Result<(), CsvImportError> {
        if self.bytes.is_empty() {
            return Err(CsvImportError::EmptyFile);
        }
        if !self.file_name.to_lowercase().ends_with(".csv") {
            return Err(CsvImportError::NotCsv(self.file_name.clone()));
        }
        if self.bytes.len() > max_bytes {
            return Err(CsvImportError::TooLarge {
                size: self.bytes.len(),
                max: max_bytes,
            });
        }
        Ok(())
    }
}

/// Describe how a file would be read: delimiter, headers, and the first
/// data row before and after cleaning. Header mapping uses `aliases`.
pub fn analyze<F: Copy + PartialEq + std::fmt::Debug + 'static>(
    upload: &Upload,
    aliases: &AliasTable<F>,
) -> Result<CsvAnalysis, CsvImportError> {
    let text = sniff::decode(&upload.bytes)?;
    let delimiter = sniff::detect_delimiter(text);
    let counts = sniff::first_content_line(text)
        .map(sniff::count_delimiters)
        .unwrap_or_default();
    let (body, _) = sniff::skip_blank_lines(text);

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| CsvImportError::Parse(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    let normalized_headers: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
    let mapped_fields = normalized_headers
        .iter()
        .map(|h| aliases.lookup(h).map(|f| format!("{f:?}")))
        .collect();

    let mut first_row = Vec::new();
    let mut data_rows = 0;
    for record in reader.records() {
        let record = record.map_err(|e| CsvImportError::Parse(e.to_string()))?;
        if data_rows == 0 {
            first_row = record.iter().map(str::to_string).collect();
        }
        data_rows += 1;
    }
    let first_row_cleaned = first_row.iter().map(|c| value::clean_value(c)).collect();

    Ok(CsvAnalysis {
        file_name: upload.file_name.clone(),
        size_bytes: upload.bytes.len(),
        detected_delimiter: (delimiter as char).to_string(),
        comma_count: counts.comma,
        semicolon_count: counts.semicolon,
        tab_count: counts.tab,
        pipe_count: counts.pipe,
        headers,
        normalized_headers,
        mapped_fields,
        first_row,
        first_row_cleaned,
        data_rows,
    })
}

/// Alias table for chemical files, for use with [`analyze`].
pub fn chemical_aliases() -> &'static AliasTable<chemical::ChemicalField> {
    <labinv_types::chemical::ChemicalInput as reader::CsvRecord>::aliases()
}

/// Alias table for study files, for use with [`analyze`].
pub fn study_aliases() -> &'static AliasTable<study::StudyField> {
    <labinv_types::study::StudyInput as reader::CsvRecord>::aliases()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_validation() {
        let max = 16;
        assert!(matches!(
            Upload::new("a.csv", vec![]).validate(max),
            Err(CsvImportError::EmptyFile)
        ));
        assert!(matches!(
            Upload::new("a.xlsx", b"x".to_vec()).validate(max),
            Err(CsvImportError::NotCsv(_))
        ));
        assert!(matches!(
            Upload::new("a.csv", vec![b'x'; 17]).validate(max),
            Err(CsvImportError::TooLarge { size: 17, max: 16 })
        ));
        assert!(Upload::new("DATA.CSV", b"name".to_vec()).validate(max).is_ok());
    }

    #[test]
    fn test_analyze_reports_headers_and_first_row() {
        let upload = Upload::new(
            "studies.csv",
            "\u{feff}Study Code;Risk Level;Extra\n\"RA-1\";NULL;x\nRA-2;Low;y\n"
                .as_bytes()
                .to_vec(),
        );
        let analysis = analyze(&upload, study_aliases()).unwrap();
        assert_eq!(analysis.detected_delimiter, ";");
        assert_eq!(analysis.semicolon_count, 2);
        assert_eq!(analysis.headers, vec!["Study Code", "Risk Level", "Extra"]);
        assert_eq!(analysis.normalized_headers[0], "studycode");
        assert_eq!(analysis.mapped_fields[0].as_deref(), Some("StudyCode"));
        assert_eq!(analysis.mapped_fields[2], None);
        assert_eq!(analysis.first_row, vec!["RA-1", "NULL", "x"]);
        assert_eq!(analysis.first_row_cleaned[1], None);
        assert_eq!(analysis.data_rows, 2);
    }

    #[test]
    fn test_analyze_reads_header_after_blank_lines() {
        let upload = Upload::new("c.csv", b"   

name,storage
Ethanol,Cabinet A
".to_vec());
        let analysis = analyze(&upload, chemical_aliases()).unwrap();
        assert_eq!(analysis.detected_delimiter, ",");
        assert_eq!(analysis.headers, vec!["name", "storage"]);
        assert_eq!(analysis.first_row, vec!["Ethanol", "Cabinet A"]);
        assert_eq!(analysis.data_rows, 1);
    }
}
