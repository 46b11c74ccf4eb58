use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Database identifier of a study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudyId(pub i64);

impl fmt::Display for StudyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StudyId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Maximum lengths of study text columns.
pub mod limits {
    pub const STUDY_CODE: usize = 100;
    pub const DOCUMENT_CODES: usize = 500;
    pub const MATERIAL_TYPE: usize = 100;
    pub const STUDY_LEVEL: usize = 10;
    pub const RISK_LEVEL: usize = 50;
    pub const INFO: usize = 1000;
    pub const NUMBER_OF_SAMPLES: usize = 200;
    pub const OBJECT_OF_STUDY: usize = 500;
    pub const RESPONSIBLE_PERSON: usize = 100;
    pub const STATUS: usize = 50;
}

/// A study (risk assessment) record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Study {
    pub id: StudyId,
    pub study_code: String,
    pub document_codes: Option<String>,
    pub material_type: Option<String>,
    pub study_level: Option<String>,
    pub risk_level: Option<String>,
    pub info: Option<String>,
    pub number_of_samples: Option<String>,
    pub object_of_study: Option<String>,
    pub responsible_person: Option<String>,
    pub status: Option<String>,
    pub qr_code: Option<String>,
    #[serde(skip)]
    pub qr_code_image: Option<Vec<u8>>,
    pub qr_code_generated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<String>,
}

/// Mutable fields of a study.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudyInput {
    pub study_code: String,
    pub document_codes: Option<String>,
    pub material_type: Option<String>,
    pub study_level: Option<String>,
    pub risk_level: Option<String>,
    pub info: Option<String>,
    pub number_of_samples: Option<String>,
    pub object_of_study: Option<String>,
    pub responsible_person: Option<String>,
    pub status: Option<String>,
}

/// Uniqueness key for a study code: trimmed and Unicode-lowercased.
pub fn study_code_key(study_code: &str) -> String {
    study_code.trim().to_lowercase()
}

impl StudyInput {
    /// Case-insensitive key used for duplicate detection.
    pub fn key(&self) -> String {
        study_code_key(&self.study_code)
    }

    /// Returns the name of the first field exceeding its column limit.
    pub fn oversized_field(&self) -> Option<&'static str> {
        fn over(v: &Option<String>, max: usize) -> bool {
            v.as_ref().is_some_and(|s| s.chars().count() > max)
        }
        if self.study_code.chars().count() > limits::STUDY_CODE {
            return Some("studyCode");
        }
        let checks: [(&Option<String>, usize, &'static str); 9] = [
            (&self.document_codes, limits::DOCUMENT_CODES, "documentCodes"),
            (&self.material_type, limits::MATERIAL_TYPE, "materialType"),
            (&self.study_level, limits::STUDY_LEVEL, "studyLevel"),
            (&self.risk_level, limits::RISK_LEVEL, "riskLevel"),
            (&self.info, limits::INFO, "info"),
            (&self.number_of_samples, limits::NUMBER_OF_SAMPLES, "numberOfSamples"),
            (&self.object_of_study, limits::OBJECT_OF_STUDY, "objectOfStudy"),
            (&self.responsible_person, limits::RESPONSIBLE_PERSON, "responsiblePerson"),
            (&self.status, limits::STATUS, "status"),
        ];
        checks
            .into_iter()
            .find(|(value, max, _)| over(value, *max))
            .map(|(_, _, name)| name)
    }
}

impl From<&Study> for StudyInput {
    fn from(s: &Study) -> Self {
        Self {
            study_code: s.study_code.clone(),
            document_codes: s.document_codes.clone(),
            material_type: s.material_type.clone(),
            study_level: s.study_level.clone(),
            risk_level: s.risk_level.clone(),
            info: s.info.clone(),
            number_of_samples: s.number_of_samples.clone(),
            object_of_study: s.object_of_study.clone(),
            responsible_person: s.responsible_person.clone(),
            status: s.status.clone(),
        }
    }
}

/// Filter for the study listing. At most one criterion is applied,
/// in the order status, risk level, responsible person.
#[derive(Debug, Clone, Default)]
pub struct StudyFilter {
    /// Substring match, case-insensitive.
    pub status: Option<String>,
    /// Exact match, case-insensitive.
    pub risk_level: Option<String>,
    /// Substring match, case-insensitive.
    pub responsible_person: Option<String>,
    /// Substring match on the study code.
    pub study_code: Option<String>,
}

/// Aggregate counts shown on the study dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyStats {
    pub total: i64,
    pub completed: i64,
    pub in_progress: i64,
    pub pending: i64,
    pub high_risk: i64,
    pub medium_risk: i64,
    pub low_risk: i64,
}
