//! Delimiter detection and text decoding for uploaded CSV files.

use labinv_types::error::CsvImportError;

/// Occurrences of candidate delimiters on the header line, outside quotes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DelimiterCounts {
    pub comma: usize,
    pub semicolon: usize,
    pub tab: usize,
    pub pipe: usize,
}

/// Decode uploaded bytes as UTF-8, dropping a leading byte order mark.
pub fn decode(bytes: &[u8]) -> Result<&str, CsvImportError> {
    let text = std::str::from_utf8(bytes).map_err(|e| CsvImportError::Encoding(e.to_string()))?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}

/// First line containing anything other than whitespace.
pub fn first_content_line(text: &str) -> Option<&str> {
    text.lines()
        .map(|l| l.trim_end_matches('\r'))
        .find(|l| !l.trim().is_empty())
}

/// Text starting at the first line with content, and the number of
/// whitespace-only lines dropped before it.
pub fn skip_blank_lines(text: &str) -> (&str, u64) {
    let mut rest = text;
    let mut skipped = 0;
    while let Some(end) = rest.find('\n') {
        if !rest[..end].trim().is_empty() {
            break;
        }
        rest = &rest[end + 1..];
        skipped += 1;
    }
    (rest, skipped)
}

/// Count candidate delimiters in `line`, skipping quoted sections.
pub fn count_delimiters(line: &str) -> DelimiterCounts {
    let mut counts = DelimiterCounts::default();
    let mut in_quotes = false;
    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            _ if in_quotes => {}
            ',' => counts.comma += 1,
            ';' => counts.semicolon += 1,
            '\t' => counts.tab += 1,
            '|' => counts.pipe += 1,
            _ => {}
        }
    }
    counts
}

/// Pick `,` or `;` for the file by counting both on its header line.
///
/// Semicolon wins ties, including files with a single column, since that is
/// what spreadsheet exports in European locales produce.
pub fn detect_delimiter(text: &str) -> u8 {
    let Some(line) = first_content_line(text) else {
        return b';';
    };
    let counts = count_delimiters(line);
    if counts.comma > counts.semicolon {
        b','
    } else {
        b';'
    }
}
