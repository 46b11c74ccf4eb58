use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Database identifier of a chemical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChemicalId(pub i64);

impl fmt::Display for ChemicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ChemicalId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// A chemical held in the laboratory inventory.
///
/// `name` is unique (case-insensitive). The QR image itself is never
/// serialized; it is served separately as PNG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chemical {
    pub id: ChemicalId,
    pub name: String,
    pub cas_no: Option<String>,
    pub lot_no: Option<String>,
    pub producer: Option<String>,
    pub storage: String,
    pub quantity: Option<i32>,
    pub toxic_state: Option<bool>,
    pub responsible: Option<String>,
    pub order_date: Option<NaiveDate>,
    pub weight: Option<String>,
    /// UUID identifier encoded in the QR code, if one has been generated.
    pub qr_code: Option<String>,
    #[serde(skip)]
    pub qr_code_image: Option<Vec<u8>>,
    pub qr_code_generated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable fields of a chemical, used for both create and full update.
///
/// Accepts the legacy `CASNo`/`LotNo` spellings as aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChemicalInput {
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "CASNo")]
    pub cas_no: Option<String>,
    #[serde(default, alias = "LotNo")]
    pub lot_no: Option<String>,
    #[serde(default)]
    pub producer: Option<String>,
    #[serde(default)]
    pub storage: String,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub toxic_state: Option<bool>,
    #[serde(default)]
    pub responsible: Option<String>,
    #[serde(default)]
    pub order_date: Option<NaiveDate>,
    #[serde(default)]
    pub weight: Option<String>,
}

/// Uniqueness key for a chemical name: trimmed and Unicode-lowercased.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl ChemicalInput {
    /// Case-insensitive key used for duplicate detection.
    pub fn key(&self) -> String {
        name_key(&self.name)
    }
}

impl From<&Chemical> for ChemicalInput {
    fn from(c: &Chemical) -> Self {
        Self {
            name: c.name.clone(),
            cas_no: c.cas_no.clone(),
            lot_no: c.lot_no.clone(),
            producer: c.producer.clone(),
            storage: c.storage.clone(),
            quantity: c.quantity,
            toxic_state: c.toxic_state,
            responsible: c.responsible.clone(),
            order_date: c.order_date,
            weight: c.weight.clone(),
        }
    }
}

/// Filter for the paged chemical listing.
///
/// Only the first non-blank criterion is applied, in the order
/// name, storage, responsible.
#[derive(Debug, Clone, Default)]
pub struct ChemicalFilter {
    pub name: Option<String>,
    pub storage: Option<String>,
    pub responsible: Option<String>,
    pub toxic_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chemical_id_parse() {
        let id: ChemicalId = " 42 ".parse().unwrap();
        assert_eq!(id, ChemicalId(42));
        assert!("abc".parse::<ChemicalId>().is_err());
    }

    #[test]
    fn test_input_accepts_legacy_aliases() {
        let json = r#"{"name":"Ethanol","CASNo":"64-17-5","LotNo":"L1","storage":"Cabinet A","toxicState":false}"#;
        let input: ChemicalInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.cas_no.as_deref(), Some("64-17-5"));
        assert_eq!(input.lot_no.as_deref(), Some("L1"));
        assert_eq!(input.toxic_state, Some(false));
        assert_eq!(input.key(), "ethanol");
    }

    #[test]
    fn test_chemical_serializes_camel_case_without_image() {
        let now = Utc::now();
        let chem = Chemical {
            id: ChemicalId(1),
            name: "Acetone".to_string(),
            cas_no: Some("67-64-1".to_string()),
            lot_no: None,
            producer: None,
            storage: "Shelf 2".to_string(),
            quantity: Some(3),
            toxic_state: Some(true),
            responsible: None,
            order_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            weight: None,
            qr_code: None,
            qr_code_image: Some(vec![1, 2, 3]),
            qr_code_generated_at: None,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&chem).unwrap();
        assert_eq!(value["casNo"], "67-64-1");
        assert_eq!(value["orderDate"], "2024-03-01");
        assert!(value.get("qrCodeImage").is_none());
    }
}
