//! Header normalization and column-to-field mapping.

/// Canonical header form: lowercase ASCII alphanumerics only.
///
/// `"CAS No."`, `"cas_no"` and `"CasNo"` all become `"casno"`.
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Resolves normalized header names to a field of type `F`.
pub struct AliasTable<F: 'static> {
    entries: &'static [(F, &'static [&'static str])],
}

impl<F: Copy + PartialEq + 'static> AliasTable<F> {
    pub const fn new(entries: &'static [(F, &'static [&'static str])]) -> Self {
        Self { entries }
    }

    /// Field for an already normalized header.
    pub fn lookup(&self, normalized: &str) -> Option<F> {
        self.entries
            .iter()
            .find(|(_, aliases)| aliases.contains(&normalized))
            .map(|(field, _)| *field)
    }
}

/// Column positions of each recognized field in one file.
#[derive(Debug, Clone)]
pub struct ColumnMap<F> {
    columns: Vec<(F, usize)>,
}

impl<F: Copy + PartialEq + std::fmt::Debug + 'static> ColumnMap<F> {
    /// Map raw headers through `aliases`. When two columns resolve to the
    /// same field the leftmost one is used.
    pub fn build<'a>(headers: impl IntoIterator<Item = &'a str>, aliases: &AliasTable<F>) -> Self {
        let mut columns: Vec<(F, usize)> = Vec::new();
        for (index, raw) in headers.into_iter().enumerate() {
            let normalized = normalize_header(raw);
            match aliases.lookup(&normalized) {
                Some(field) if !columns.iter().any(|(f, _)| *f == field) => {
                    columns.push((field, index));
                }
                Some(field) => {
                    tracing::debug!(header = raw, ?field, "duplicate column ignored");
                }
                None => {
                    tracing::debug!(header = raw, "unknown column ignored");
                }
            }
        }
        Self { columns }
    }

    pub fn index_of(&self, field: F) -> Option<usize> {
        self.columns
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, i)| *i)
    }

    pub fn contains(&self, field: F) -> bool {
        self.index_of(field).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Field {
        Code,
        Level,
    }

    static ALIASES: AliasTable<Field> = AliasTable::new(&[
        (Field::Code, &["studycode", "code"]),
        (Field::Level, &["studylevel", "level"]),
    ]);

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("Study Code"), "studycode");
        assert_eq!(normalize_header("study_code"), "studycode");
        assert_eq!(normalize_header("\u{feff}CAS No."), "casno");
        assert_eq!(normalize_header("  Risk-Level "), "risklevel");
    }

    #[test]
    fn test_column_map_uses_aliases_and_first_match() {
        let map = ColumnMap::build(["Notes", "Code", "Study Level", "study_code"], &ALIASES);
        assert_eq!(map.index_of(Field::Code), Some(1));
        assert_eq!(map.index_of(Field::Level), Some(2));
    }

    #[test]
    fn test_column_map_missing_field() {
        let map = ColumnMap::build(["level"], &ALIASES);
        assert!(!map.contains(Field::Code));
        assert!(map.contains(Field::Level));
    }
}
