//! Multipart CSV upload extractor.
//!
//! Reads the `file` field of a `multipart/form-data` body into an
//! [`Upload`]. Size and extension checks happen in the import services.

use axum::extract::{FromRequest, Multipart, Request};

use labinv_core::tabular::Upload;
use labinv_types::error::CsvImportError;

use crate::http::error::AppError;
use crate::state::AppState;

/// Name of the form field carrying the file.
pub const FILE_FIELD: &str = "file";

/// The uploaded CSV file.
pub struct CsvUpload(pub Upload);

impl FromRequest<AppState> for CsvUpload {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("invalid multipart body: {}", e.body_text())))?
        {
            if field.name() != Some(FILE_FIELD) {
                continue;
            }
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("failed to read upload: {}", e.body_text())))?;
            tracing::debug!(file = %file_name, bytes = bytes.len(), "received csv upload");
            return Ok(CsvUpload(Upload::new(file_name, bytes.to_vec())));
        }

        Err(CsvImportError::EmptyFile.into())
    }
}
