//! CSV mapping for studies.

use labinv_types::study::{Study, StudyInput};

use super::export::{CsvExport, opt_text};
use super::header::AliasTable;
use super::reader::{CsvRecord, MappedRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyField {
    StudyCode,
    DocumentCodes,
    MaterialType,
    StudyLevel,
    RiskLevel,
    Info,
    NumberOfSamples,
    ObjectOfStudy,
    ResponsiblePerson,
    Status,
}

static ALIASES: AliasTable<StudyField> = AliasTable::new(&[
    (StudyField::StudyCode, &["studycode", "code", "study", "studyid", "studynumber", "studyno"]),
    (StudyField::DocumentCodes, &["documentcodes", "documentcode", "documents", "document", "doccodes"]),
    (StudyField::MaterialType, &["materialtype", "material", "type"]),
    (StudyField::StudyLevel, &["studylevel", "level"]),
    (StudyField::RiskLevel, &["risklevel", "risk"]),
    (StudyField::Info, &["info", "information", "description", "notes", "remarks"]),
    (StudyField::NumberOfSamples, &["numberofsamples", "samples", "samplecount", "noofsamples", "nrofsamples"]),
    (StudyField::ObjectOfStudy, &["objectofstudy", "object", "studyobject"]),
    (StudyField::ResponsiblePerson, &["responsibleperson", "responsible", "owner"]),
    (StudyField::Status, &["status", "state"]),
]);

impl CsvRecord for StudyInput {
    type Field = StudyField;

    const ENTITY: &'static str = "study";

    fn aliases() -> &'static AliasTable<StudyField> {
        &ALIASES
    }

    fn required_fields() -> &'static [(StudyField, &'static str)] {
        &[(StudyField::StudyCode, "studyCode")]
    }

    fn from_row(row: &MappedRow<'_, StudyField>) -> Result<Self, String> {
        let study_code = row
            .text(StudyField::StudyCode)
            .ok_or_else(|| "study code is required".to_string())?;

        let input = StudyInput {
            study_code,
            document_codes: row.text(StudyField::DocumentCodes),
            material_type: row.text(StudyField::MaterialType),
            study_level: row.text(StudyField::StudyLevel),
            risk_level: row.text(StudyField::RiskLevel),
            info: row.text(StudyField::Info),
            number_of_samples: row.text(StudyField::NumberOfSamples),
            object_of_study: row.text(StudyField::ObjectOfStudy),
            responsible_person: row.text(StudyField::ResponsiblePerson),
            status: row.text(StudyField::Status),
        };
        if let Some(field) = input.oversized_field() {
            return Err(format!("{field} is too long for '{}'", input.study_code));
        }
        Ok(input)
    }

    fn key(&self) -> String {
        StudyInput::key(self)
    }
}

impl CsvExport for Study {
    const STEM: &'static str = "studies";
    const DELIMITER: u8 = b';';
    const HEADER: &'static [&'static str] = &[
        "studyCode",
        "documentCodes",
        "materialType",
        "studyLevel",
        "riskLevel",
        "info",
        "numberOfSamples",
        "objectOfStudy",
        "responsiblePerson",
        "status",
    ];

    fn to_row(&self) -> Vec<String> {
        vec![
            self.study_code.clone(),
            opt_text(&self.document_codes),
            opt_text(&self.material_type),
            opt_text(&self.study_level),
            opt_text(&self.risk_level),
            opt_text(&self.info),
            opt_text(&self.number_of_samples),
            opt_text(&self.object_of_study),
            opt_text(&self.responsible_person),
            opt_text(&self.status),
        ]
    }
}
