//! CSV mapping for chemicals.

use labinv_types::chemical::{Chemical, ChemicalInput};

use super::export::{CsvExport, opt_date, opt_display, opt_text};
use super::header::AliasTable;
use super::reader::{CsvRecord, MappedRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChemicalField {
    Name,
    CasNo,
    LotNo,
    Producer,
    Storage,
    Quantity,
    ToxicState,
    Responsible,
    OrderDate,
    Weight,
}

static ALIASES: AliasTable<ChemicalField> = AliasTable::new(&[
    (ChemicalField::Name, &["name", "chemicalname", "chemical", "substance", "productname"]),
    (ChemicalField::CasNo, &["casno", "cas", "casnumber", "casnr", "casnummer"]),
    (ChemicalField::LotNo, &["lotno", "lot", "lotnumber", "lotnr", "batch", "batchno", "charge"]),
    (ChemicalField::Producer, &["producer", "manufacturer", "supplier", "hersteller"]),
    (ChemicalField::Storage, &["storage", "storagelocation", "location", "lagerort"]),
    (ChemicalField::Quantity, &["quantity", "qty", "amount", "menge", "anzahl"]),
    (ChemicalField::ToxicState, &["toxicstate", "toxic", "istoxic", "toxicity", "giftig"]),
    (ChemicalField::Responsible, &["responsible", "responsibleperson", "owner", "verantwortlich"]),
    (ChemicalField::OrderDate, &["orderdate", "dateordered", "ordered", "date", "bestelldatum"]),
    (ChemicalField::Weight, &["weight", "mass", "gewicht"]),
]);

impl CsvRecord for ChemicalInput {
    type Field = ChemicalField;

    const ENTITY: &'static str = "chemical";

    fn aliases() -> &'static AliasTable<ChemicalField> {
        &ALIASES
    }

    fn required_fields() -> &'static [(ChemicalField, &'static str)] {
        &[(ChemicalField::Name, "name")]
    }

    fn from_row(row: &MappedRow<'_, ChemicalField>) -> Result<Self, String> {
        let name = row
            .text(ChemicalField::Name)
            .ok_or_else(|| "name is required".to_string())?;
        let storage = row
            .text(ChemicalField::Storage)
            .ok_or_else(|| format!("storage is required for '{name}'"))?;

        Ok(ChemicalInput {
            name,
            cas_no: row.text(ChemicalField::CasNo),
            lot_no: row.text(ChemicalField::LotNo),
            producer: row.text(ChemicalField::Producer),
            storage,
            quantity: row.int(ChemicalField::Quantity),
            toxic_state: row.bool(ChemicalField::ToxicState),
            responsible: row.text(ChemicalField::Responsible),
            order_date: row.date(ChemicalField::OrderDate),
            weight: row.text(ChemicalField::Weight),
        })
    }

    fn key(&self) -> String {
        ChemicalInput::key(self)
    }
}

impl CsvExport for Chemical {
    const STEM: &'static str = "chemicals";
    const DELIMITER: u8 = b',';
    const HEADER: &'static [&'static str] = &[
        "name",
        "CASNo",
        "LotNo",
        "producer",
        "storage",
        "quantity",
        "toxicState",
        "responsible",
        "orderDate",
        "weight",
    ];

    fn to_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            opt_text(&self.cas_no),
            opt_text(&self.lot_no),
            opt_text(&self.producer),
            self.storage.clone(),
            opt_display(&self.quantity),
            opt_display(&self.toxic_state),
            opt_text(&self.responsible),
            opt_date(&self.order_date),
            opt_text(&self.weight),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tabular::reader::parse_records;
    use chrono::{NaiveDate, Utc};
    use labinv_types::chemical::ChemicalId;
    use labinv_types::error::CsvImportError;

    #[test]
    fn test_semicolon_file_with_aliases() {
        let csv = "Chemical Name;CAS No.;Lot;Storage Location;Qty;Toxic;Order Date\n\
                   Ethanol;64-17-5;L-1;Cabinet A;5;ja;15.03.2024\n\
                   Acetone;67-64-1;;Shelf 2;2.0;no;2024-01-02\n";
        let parsed = parse_records::<ChemicalInput>(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 2);

        let ethanol = &parsed.rows[0].record;
        assert_eq!(ethanol.name, "Ethanol");
        assert_eq!(ethanol.cas_no.as_deref(), Some("64-17-5"));
        assert_eq!(ethanol.storage, "Cabinet A");
        assert_eq!(ethanol.quantity, Some(5));
        assert_eq!(ethanol.toxic_state, Some(true));
        assert_eq!(ethanol.order_date, NaiveDate::from_ymd_opt(2024, 3, 15));

        let acetone = &parsed.rows[1].record;
        assert_eq!(acetone.lot_no, None);
        assert_eq!(acetone.quantity, Some(2));
        assert_eq!(acetone.toxic_state, Some(false));
    }

    #[test]
    fn test_invalid_and_duplicate_rows_are_skipped() {
        let csv = "name,storage,quantity\n\
                   Ethanol,Cabinet A,1\n\
                   ,Cabinet B,2\n\
                   Methanol,,3\n\
                   ETHANOL,Cabinet C,4\n\
                   \n\
                   Toluene,Cabinet D,lots\n";
        let parsed = parse_records::<ChemicalInput>(csv.as_bytes()).unwrap();
        let names: Vec<&str> = parsed.rows.iter().map(|r| r.record.name.as_str()).collect();
        assert_eq!(names, vec!["Ethanol", "Toluene"]);
        assert_eq!(parsed.report.total_rows, 5);
        assert_eq!(parsed.report.invalid_rows, 2);
        assert_eq!(parsed.report.skipped_duplicates, 1);
        // Unparseable quantity keeps the row with the value left empty.
        assert_eq!(parsed.rows[1].record.quantity, None);
        assert_eq!(parsed.rows[0].record.storage, "Cabinet A");
    }

    #[test]
    fn test_whitespace_lines_before_header_are_skipped() {
        let csv = "   \n\t\nname,storage\nEthanol,Cabinet A\n,Cabinet B\n";
        let parsed = parse_records::<ChemicalInput>(csv.as_bytes()).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].record.name, "Ethanol");
        assert_eq!(parsed.rows[0].record.storage, "Cabinet A");
        // Line numbers still count from the top of the file.
        assert_eq!(parsed.rows[0].line, 4);
        assert_eq!(parsed.report.issues[0].line, 5);
    }

    #[test]
    fn test_quoted_fields_with_embedded_delimiters() {
        let csv = "name,storage,producer\n\"Sodium chloride, pure\",\"Room 1\",\"ACME \"\"Labs\"\"\"\n";
        let parsed = parse_records::<ChemicalInput>(csv.as_bytes()).unwrap();
        let row = &parsed.rows[0].record;
        assert_eq!(row.name, "Sodium chloride, pure");
        assert_eq!(row.producer.as_deref(), Some("ACME \"Labs\""));
    }

    #[test]
    fn test_no_valid_rows_is_an_error() {
        let csv = "name,storage\n,Cabinet\nOnlyName,\n";
        let err = parse_records::<ChemicalInput>(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CsvImportError::NoValidRecords(_)));
    }

    #[test]
    fn test_missing_name_column_is_an_error() {
        let csv = "storage,quantity\nCabinet,1\n";
        let err = parse_records::<ChemicalInput>(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CsvImportError::MissingColumn(ref c) if c == "name"));
    }

    #[test]
    fn test_export_reimports() {
        let now = Utc::now();
        let chemical = Chemical {
            id: ChemicalId(1),
            name: "Hydrochloric acid, 37%".to_string(),
            cas_no: Some("7647-01-0".to_string()),
            lot_no: None,
            producer: Some("ACME".to_string()),
            storage: "Acid cabinet".to_string(),
            quantity: Some(2),
            toxic_state: Some(true),
            responsible: Some("Dr. Weiss".to_string()),
            order_date: NaiveDate::from_ymd_opt(2023, 11, 30),
            weight: Some("1 L".to_string()),
            qr_code: None,
            qr_code_image: None,
            qr_code_generated_at: None,
            created_at: now,
            updated_at: now,
        };
        let bytes = crate::tabular::export::write_csv(&[chemical.clone()]).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with(
            "name,CASNo,LotNo,producer,storage,quantity,toxicState,responsible,orderDate,weight\n"
        ));

        let parsed = parse_records::<ChemicalInput>(&bytes).unwrap();
        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].record, ChemicalInput::from(&chemical));
    }
}
