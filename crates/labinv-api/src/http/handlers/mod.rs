//! HTTP request handlers for the REST API.

pub mod admin;
pub mod auth;
pub mod chemical;
pub mod csv;
pub mod qr;
pub mod study;

use std::str::FromStr;

use crate::http::error::AppError;

/// Parse a numeric path id, answering 400 in the usual envelope when it
/// is not a number.
pub(crate) fn parse_id<T: FromStr>(raw: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("invalid id '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use labinv_types::chemical::ChemicalId;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id::<ChemicalId>("42").unwrap(), ChemicalId(42));
        assert_eq!(parse_id::<ChemicalId>(" 7 ").unwrap(), ChemicalId(7));
        assert!(matches!(
            parse_id::<ChemicalId>("abc"),
            Err(AppError::Validation(msg)) if msg.contains("abc")
        ));
    }
}
