//! Cell cleaning and typed value parsing.

use chrono::NaiveDate;

/// Date layouts tried in order. Day-first dotted dates come first since
/// that is the most common layout in uploaded files.
const DATE_FORMATS: [&str; 7] = [
    "%d.%m.%Y", "%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%m-%d-%Y",
];

/// Normalize a raw cell.
///
/// Trims whitespace, removes one pair of surrounding quotes (un-doubling
/// inner quotes), and maps placeholder tokens to `None`. `n/a` is kept
/// as the literal `N/A`.
pub fn clean_value(raw: &str) -> Option<String> {
    let mut value = raw.trim();
    let unquoted;
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        unquoted = value[1..value.len() - 1].replace("\"\"", "\"");
        value = unquoted.trim();
    }

    if value.is_empty() || value == "-" {
        return None;
    }
    if value.eq_ignore_ascii_case("null") || value.eq_ignore_ascii_case("#n/a") {
        return None;
    }
    if value.eq_ignore_ascii_case("n/a") {
        return Some("N/A".to_string());
    }
    Some(value.to_string())
}

/// Parse a loose boolean (`true/false`, `yes/no`, `y/n`, `1/0`, `ja/nein`, `x`).
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "ja" | "x" => Some(true),
        "false" | "no" | "n" | "0" | "nein" => Some(false),
        _ => None,
    }
}

/// Parse a whole number, also accepting a zero fraction such as `5.0`.
pub fn parse_int(value: &str) -> Option<i32> {
    let value = value.trim();
    if let Ok(n) = value.parse::<i32>() {
        return Some(n);
    }
    let f = value.replace(',', ".").parse::<f64>().ok()?;
    if f.fract() == 0.0 && f >= i32::MIN as f64 && f <= i32::MAX as f64 {
        Some(f as i32)
    } else {
        None
    }
}

/// Parse a calendar date in any supported layout. A trailing time part
/// (`2024-01-05T10:00:00`, `05.01.2024 10:00`) is ignored.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let date_part = value
        .trim()
        .split(|c: char| c == 'T' || c.is_whitespace())
        .next()?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}
